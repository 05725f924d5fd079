use std::num::IntErrorKind;

use chrono::{DateTime, SecondsFormat, Utc};
use pokebot_application::PurchaseListing;
use pokebot_domain::{DecisionRecord, PurchaseView};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Formats a timestamp the way every endpoint and page shows it.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Banner returned by `/`.
#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub ok: bool,
    pub msg: &'static str,
}

/// Liveness payload with best-effort storage statistics.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub decisions_count: usize,
    pub purchases_count: usize,
    pub latest_decision_ts: Option<String>,
    pub latest_purchase_ts: Option<String>,
}

/// Acknowledgement for a stored purchase event.
#[derive(Debug, Serialize)]
pub struct EventStoredResponse {
    pub ok: bool,
    pub id: String,
    pub stored: String,
}

/// One row of the purchases admin table.
#[derive(Debug, Serialize)]
pub struct PurchaseRow {
    pub received_at: String,
    pub site: String,
    pub order: String,
    pub amount: f64,
    pub items_preview: String,
}

impl From<PurchaseView> for PurchaseRow {
    fn from(view: PurchaseView) -> Self {
        Self {
            received_at: format_timestamp(view.received_at),
            site: view.site,
            order: view.order,
            amount: view.amount,
            items_preview: view.items_preview,
        }
    }
}

/// Rows backing the live purchases page.
#[derive(Debug, Serialize)]
pub struct PurchaseFeedResponse {
    pub ok: bool,
    pub total_usd: f64,
    pub items: Vec<PurchaseRow>,
}

impl From<&PurchaseListing> for PurchaseFeedResponse {
    fn from(listing: &PurchaseListing) -> Self {
        Self {
            ok: true,
            total_usd: listing.total_usd,
            items: listing
                .records
                .iter()
                .map(|record| {
                    PurchaseView::from_payload(&record.payload, record.modified_at).into()
                })
                .collect(),
        }
    }
}

/// Result of an inbound email post.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum InboundResponse {
    Stored { ok: bool, stored: DecisionRecord },
    Rejected { ok: bool, error: &'static str },
}

/// Poll result for a single decision token.
#[derive(Debug, Serialize)]
pub struct DecisionLookupResponse {
    pub ok: bool,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<DecisionRecord>,
}

/// Recent decisions.
#[derive(Debug, Serialize)]
pub struct DecisionListResponse {
    pub ok: bool,
    pub items: Vec<Value>,
}

/// Query string accepted by `/admin/logs`.
///
/// Both values are kept as raw strings so a malformed `n` falls back to
/// the default instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct LogsQuery {
    pub n: Option<String>,
    pub format: Option<String>,
}

impl LogsQuery {
    /// Requested line count. Out-of-range integers saturate; anything
    /// that is not an integer yields `None`.
    pub fn line_count(&self) -> Option<usize> {
        match self.n.as_deref()?.trim().parse::<i64>() {
            Ok(requested) => Some(usize::try_from(requested.max(0)).unwrap_or(usize::MAX)),
            Err(error) => match error.kind() {
                IntErrorKind::PosOverflow => Some(usize::MAX),
                IntErrorKind::NegOverflow => Some(0),
                _ => None,
            },
        }
    }

    pub fn wants_text(&self) -> bool {
        self.format
            .as_deref()
            .is_some_and(|format| format.trim().eq_ignore_ascii_case("txt"))
    }
}
