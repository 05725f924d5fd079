//! Read-side view over opaque purchase payloads.
//!
//! Purchases are stored exactly as posted. The receiver never validates
//! business fields; it only peeks at a handful of well-known ones when
//! summing amounts or rendering the admin table.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Maximum number of characters of the `items` field shown in listings.
pub const ITEMS_PREVIEW_LENGTH: usize = 120;

/// Returns the USD amount carried by a purchase payload, if any.
///
/// Accepts a JSON number or a numeric string under `amount`. Non-finite
/// values are ignored.
#[must_use]
pub fn purchase_amount(payload: &Value) -> Option<f64> {
    let amount = match payload.get("amount")? {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    amount.is_finite().then_some(amount)
}

/// Presentation fields extracted from a stored purchase.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseView {
    /// Time the purchase was received.
    pub received_at: DateTime<Utc>,
    /// Storefront the purchase came from.
    pub site: String,
    /// Order identifier reported by the storefront.
    pub order: String,
    /// Amount in USD, zero when absent.
    pub amount: f64,
    /// Truncated JSON rendering of the `items` field.
    pub items_preview: String,
}

impl PurchaseView {
    /// Builds a view from a stored payload.
    #[must_use]
    pub fn from_payload(payload: &Value, received_at: DateTime<Utc>) -> Self {
        let items = payload
            .get("items")
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new()));

        Self {
            received_at,
            site: text_field(payload, "site"),
            order: text_field(payload, "order"),
            amount: purchase_amount(payload).unwrap_or(0.0),
            items_preview: items
                .to_string()
                .chars()
                .take(ITEMS_PREVIEW_LENGTH)
                .collect(),
        }
    }
}

fn text_field(payload: &Value, name: &str) -> String {
    match payload.get(name) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn amount_accepts_numbers_and_numeric_strings() {
        assert_eq!(purchase_amount(&json!({"amount": 12.5})), Some(12.5));
        assert_eq!(purchase_amount(&json!({"amount": " 3.25 "})), Some(3.25));
        assert_eq!(purchase_amount(&json!({"amount": "n/a"})), None);
        assert_eq!(purchase_amount(&json!({"amount": null})), None);
        assert_eq!(purchase_amount(&json!([1, 2, 3])), None);
    }

    #[test]
    fn view_tolerates_missing_fields() {
        let view = PurchaseView::from_payload(&json!({"item": "pikachu"}), Utc::now());
        assert_eq!(view.site, "");
        assert_eq!(view.order, "");
        assert_eq!(view.amount, 0.0);
        assert_eq!(view.items_preview, "[]");
    }

    #[test]
    fn view_truncates_long_item_lists() {
        let items: Vec<String> = (0..100).map(|index| format!("card-{index}")).collect();
        let payload = json!({"site": "pokemoncenter", "order": 4411, "items": items});

        let view = PurchaseView::from_payload(&payload, Utc::now());

        assert_eq!(view.site, "pokemoncenter");
        assert_eq!(view.order, "4411");
        assert_eq!(view.items_preview.chars().count(), ITEMS_PREVIEW_LENGTH);
    }
}
