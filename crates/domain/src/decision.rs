//! Approval decisions relayed by the inbound email parse webhook.
//!
//! An operator replies to a notification email with `1` (approve) or `2`
//! (deny). The reply quotes a `TOKEN: <hex>` line that ties the answer back
//! to the pending purchase.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::RecordKey;

/// Minimum number of hex characters in a decision token.
pub const TOKEN_MIN_LENGTH: usize = 6;

/// Maximum number of hex characters captured for a decision token.
pub const TOKEN_MAX_LENGTH: usize = 32;

/// Operator answer carried by an inbound email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Reply `1`.
    #[serde(rename = "1")]
    Approve,
    /// Reply `2`.
    #[serde(rename = "2")]
    Deny,
}

impl Decision {
    /// Returns the wire value of the decision.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "1",
            Self::Deny => "2",
        }
    }
}

/// Fields posted by the inbound parse webhook. Everything is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InboundEmail {
    /// Sender address.
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub text: String,
    /// HTML body.
    pub html: String,
}

/// Why an inbound email could not be turned into a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundRejection {
    /// Neither body carried a `TOKEN:` line.
    MissingToken,
    /// A token was found but no unambiguous `1`/`2` answer.
    MissingDecision {
        /// Token that was found.
        token: String,
    },
}

impl InboundRejection {
    /// Stable reason identifier written to the operation log.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingToken => "no_token",
            Self::MissingDecision { .. } => "no_decision",
        }
    }

    /// Human readable message returned to the webhook caller.
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::MissingToken => "TOKEN not found in message body",
            Self::MissingDecision { .. } => "Decision (1/2) not found",
        }
    }
}

/// Persisted decision record, keyed by its token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// Hex token quoted in the reply.
    pub token: String,
    /// Parsed answer.
    pub decision: Decision,
    /// Sender address.
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Receipt time, RFC 3339 UTC.
    pub ts: String,
}

impl DecisionRecord {
    /// Parses an inbound email into a decision record received at `now`.
    pub fn from_inbound(
        email: &InboundEmail,
        now: DateTime<Utc>,
    ) -> Result<Self, InboundRejection> {
        let token = extract_token(&email.text)
            .or_else(|| extract_token(&email.html))
            .ok_or(InboundRejection::MissingToken)?;

        let body = if email.text.trim().is_empty() {
            email.html.as_str()
        } else {
            email.text.trim()
        };

        let decision = detect_decision(body).ok_or_else(|| InboundRejection::MissingDecision {
            token: token.clone(),
        })?;

        Ok(Self {
            token,
            decision,
            from: email.from.clone(),
            to: email.to.clone(),
            subject: email.subject.clone(),
            ts: now.to_rfc3339_opts(SecondsFormat::Micros, true),
        })
    }

    /// Returns the storage key of the record.
    ///
    /// Tokens are hex by construction, so this only fails for records that
    /// were not produced by [`DecisionRecord::from_inbound`].
    pub fn key(&self) -> pokebot_core::AppResult<RecordKey> {
        RecordKey::new(self.token.as_str())
    }
}

/// Finds the first `token : <hex>` occurrence, case-insensitively.
///
/// Captures between [`TOKEN_MIN_LENGTH`] and [`TOKEN_MAX_LENGTH`] hex
/// characters; longer runs are cut at the maximum.
#[must_use]
pub fn extract_token(body: &str) -> Option<String> {
    let lowered = body.to_ascii_lowercase();
    let mut search_from = 0;

    while let Some(offset) = lowered[search_from..].find("token") {
        let label_start = search_from + offset;
        if let Some(token) = token_after_label(&body[label_start + "token".len()..]) {
            return Some(token);
        }
        search_from = label_start + 1;
    }

    None
}

fn token_after_label(rest: &str) -> Option<String> {
    let value = rest.trim_start().strip_prefix(':')?.trim_start();
    let token: String = value
        .chars()
        .take_while(char::is_ascii_hexdigit)
        .take(TOKEN_MAX_LENGTH)
        .collect();

    (token.len() >= TOKEN_MIN_LENGTH).then_some(token)
}

/// Detects the operator answer in a reply body.
///
/// A line consisting solely of `1` or `2` wins. Otherwise the body must
/// mention exactly one of the two digits.
#[must_use]
pub fn detect_decision(body: &str) -> Option<Decision> {
    for line in body.lines() {
        match line.trim() {
            "1" => return Some(Decision::Approve),
            "2" => return Some(Decision::Deny),
            _ => {}
        }
    }

    match (body.contains('1'), body.contains('2')) {
        (true, false) => Some(Decision::Approve),
        (false, true) => Some(Decision::Deny),
        _ => None,
    }
}
