//! Server-rendered admin pages.
//!
//! The static pages render straight from the services. The live pages are
//! fixed documents that poll the JSON endpoints every few seconds.

use std::fmt::Write as _;

use pokebot_application::PurchaseListing;
use serde_json::Value;

use crate::dto::PurchaseFeedResponse;

const PAGE_STYLE: &str = r#"    body { font-family: system-ui, -apple-system, Segoe UI, Roboto, Helvetica, Arial, sans-serif; padding: 24px; }
    h1 { margin-top: 0; }
    .total { font-size: 18px; margin: 8px 0 16px; }
    table { width: 100%; border-collapse: collapse; }
    th, td { padding: 8px 10px; border-bottom: 1px solid #eee; text-align: left; font-size: 14px; }
    th { background: #fafafa; }
    code { background: #f4f4f4; padding: 2px 4px; border-radius: 4px; }
    .amount { text-align: right; }
    .new { background: #e6ffed; }"#;

/// Escapes text for use in HTML element content and quoted attributes.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for character in value.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn document(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <style>
{PAGE_STYLE}
  </style>
</head>
<body>
{body}
</body>
</html>"#
    )
}

fn format_usd(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u128;
    let (dollars, cents) = (cents / 100, cents % 100);

    let digits = dollars.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && (dollars > 0 || cents > 0) {
        "-"
    } else {
        ""
    };
    format!("{sign}${grouped}.{cents:02}")
}

fn text_field(record: &Value, name: &str) -> String {
    match record.get(name) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Renders the purchases table with its USD total.
pub fn render_purchases_page(listing: &PurchaseListing) -> String {
    let feed = PurchaseFeedResponse::from(listing);
    let mut rows = String::new();
    for row in &feed.items {
        let _ = writeln!(
            rows,
            "      <tr><td>{}</td><td>{}</td><td>{}</td><td class=\"amount\">{}</td><td>{}</td></tr>",
            escape_html(&row.received_at),
            escape_html(&row.site),
            escape_html(&row.order),
            format_usd(row.amount),
            escape_html(&row.items_preview),
        );
    }
    if rows.is_empty() {
        rows.push_str("      <tr><td colspan=\"5\">No purchases yet</td></tr>\n");
    }

    let body = format!(
        r#"  <h1>PokeBot: Purchases</h1>
  <div class="total"><strong>Total USD:</strong> {total}</div>
  <table>
    <thead>
      <tr><th>Timestamp (UTC)</th><th>Site</th><th>Order ID</th><th>Amount</th><th>Items</th></tr>
    </thead>
    <tbody>
{rows}    </tbody>
  </table>
  <p style="margin-top:24px;">JSON: <a href="/purchases.json">/purchases.json</a> | Live: <a href="/admin/purchases/live">/admin/purchases/live</a></p>"#,
        total = format_usd(feed.total_usd),
    );

    document("PokeBot Purchases", &body)
}

/// Renders the recent decisions table.
pub fn render_decisions_page(items: &[Value]) -> String {
    let mut rows = String::new();
    for item in items {
        let _ = writeln!(
            rows,
            "      <tr><td>{}</td><td><code>{}</code></td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&text_field(item, "ts")),
            escape_html(&text_field(item, "token")),
            escape_html(&text_field(item, "decision")),
            escape_html(&text_field(item, "from")),
            escape_html(&text_field(item, "to")),
            escape_html(&text_field(item, "subject")),
        );
    }
    if rows.is_empty() {
        rows.push_str("      <tr><td colspan=\"6\">No decisions yet</td></tr>\n");
    }

    let body = format!(
        r#"  <h1>PokeBot: Recent Decisions</h1>
  <p>Showing the most recent approvals and denials captured from inbound email.</p>
  <table>
    <thead>
      <tr><th>Timestamp (UTC)</th><th>Token</th><th>Decision</th><th>From</th><th>To</th><th>Subject</th></tr>
    </thead>
    <tbody>
{rows}    </tbody>
  </table>
  <p style="margin-top:24px;">JSON: <a href="/decisions.json">/decisions.json</a></p>
  <p style="margin-top:8px;">Live view: <a href="/admin/live">/admin/live</a></p>
  <p style="margin-top:8px;">Purchases: <a href="/admin/purchases">/admin/purchases</a> | <a href="/admin/purchases/live">/admin/purchases/live</a></p>"#
    );

    document("PokeBot Decisions", &body)
}

const LIVE_SCRIPT_HELPERS: &str = r#"let known = new Set();
function esc(s){return (s==null?'':s).toString().replace(/[&<>"]/g, t => ({'&':'&amp;','<':'&lt;','>':'&gt;','"':'&quot;'}[t]));}
function flash(tr, key){
  if(!known.has(key)){ tr.classList.add('new'); setTimeout(()=>tr.classList.remove('new'), 1200); }
  known.add(key);
}"#;

/// Renders the auto-refreshing purchases page.
pub fn render_purchases_live_page() -> String {
    let body = format!(
        r#"  <h1>PokeBot: Purchases (Live)</h1>
  <p>Auto-refreshing view (every 4s). New rows flash green briefly.</p>
  <div class="total"><strong>Total USD:</strong> <span id="total">$0.00</span></div>
  <table>
    <thead>
      <tr><th>Timestamp (UTC)</th><th>Site</th><th>Order ID</th><th>Amount</th><th>Items</th></tr>
    </thead>
    <tbody id="tbody">
      <tr><td colspan="5">Loading...</td></tr>
    </tbody>
  </table>
<script>
{LIVE_SCRIPT_HELPERS}
function fmt(n){{try{{return new Intl.NumberFormat(undefined,{{style:'currency',currency:'USD'}}).format(n)}}catch(e){{return '$'+Number(n).toFixed(2)}}}}
function render(items){{
  const tb = document.getElementById('tbody');
  tb.innerHTML = '';
  for(const it of items){{
    const tr = document.createElement('tr');
    flash(tr, JSON.stringify(it));
    tr.innerHTML = `<td>${{esc(it.received_at)}}</td>
                    <td>${{esc(it.site)}}</td>
                    <td>${{esc(it.order)}}</td>
                    <td class="amount">${{fmt(it.amount)}}</td>
                    <td>${{esc(it.items_preview)}}</td>`;
    tb.appendChild(tr);
  }}
}}
async function tick(){{
  try{{
    const r = await fetch('/admin/purchases/feed', {{credentials: 'same-origin'}});
    if(!r.ok){{ return; }}
    const j = await r.json();
    if(j && j.ok && Array.isArray(j.items)){{
      render(j.items);
      document.getElementById('total').textContent = fmt(j.total_usd);
    }}
  }}catch(e){{}}
}}
tick();
setInterval(tick, 4000);
</script>"#
    );

    document("PokeBot Purchases (Live)", &body)
}

/// Renders the auto-refreshing decisions page.
pub fn render_decisions_live_page() -> String {
    let body = format!(
        r#"  <h1>PokeBot: Live Decisions</h1>
  <p>Auto-refreshing view (every 4s). New rows flash green briefly.</p>
  <table>
    <thead>
      <tr><th>Timestamp (UTC)</th><th>Token</th><th>Decision</th><th>From</th><th>To</th><th>Subject</th></tr>
    </thead>
    <tbody id="tbody">
      <tr><td colspan="6">Loading...</td></tr>
    </tbody>
  </table>
<script>
{LIVE_SCRIPT_HELPERS}
function render(items){{
  const tb = document.getElementById('tbody');
  tb.innerHTML = '';
  for(const it of items){{
    const tr = document.createElement('tr');
    flash(tr, it.token);
    tr.innerHTML = `<td>${{esc(it.ts)}}</td>
                    <td><code>${{esc(it.token)}}</code></td>
                    <td>${{esc(it.decision)}}</td>
                    <td>${{esc(it.from)}}</td>
                    <td>${{esc(it.to)}}</td>
                    <td>${{esc(it.subject)}}</td>`;
    tb.appendChild(tr);
  }}
}}
async function tick(){{
  try{{
    const r = await fetch('/decisions.json', {{credentials: 'same-origin'}});
    if(!r.ok){{ return; }}
    const j = await r.json();
    if(j && j.ok && Array.isArray(j.items)){{ render(j.items); }}
  }}catch(e){{}}
}}
tick();
setInterval(tick, 4000);
</script>"#
    );

    document("PokeBot Decisions (Live)", &body)
}
