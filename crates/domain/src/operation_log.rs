//! Operational log entries written while handling webhook traffic.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

/// Kind of operation recorded in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// A purchase payload was persisted.
    PurchaseStore,
    /// A purchase payload was rejected before persistence.
    EventRejected,
    /// A decision record was persisted.
    DecisionStore,
    /// An inbound email could not be turned into a decision.
    Inbound,
}

impl OperationKind {
    /// Returns the stable `type` value written to the log.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PurchaseStore => "purchase_store",
            Self::EventRejected => "event_rejected",
            Self::DecisionStore => "decision_store",
            Self::Inbound => "inbound",
        }
    }
}

/// One line of the operation log.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationLogEntry {
    ts: DateTime<Utc>,
    kind: OperationKind,
    ok: bool,
    fields: Map<String, Value>,
}

impl OperationLogEntry {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn new(kind: OperationKind, ok: bool) -> Self {
        Self::at(Utc::now(), kind, ok)
    }

    /// Creates an entry stamped with an explicit time.
    #[must_use]
    pub fn at(ts: DateTime<Utc>, kind: OperationKind, ok: bool) -> Self {
        Self {
            ts,
            kind,
            ok,
            fields: Map::new(),
        }
    }

    /// Attaches an extra field. Reserved names (`ts`, `type`, `ok`) are ignored.
    #[must_use]
    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        if !matches!(name, "ts" | "type" | "ok") {
            self.fields.insert(name.to_owned(), value.into());
        }
        self
    }

    /// Returns the entry kind.
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Serializes the entry as a single JSON line without trailing newline.
    #[must_use]
    pub fn to_json_line(&self) -> String {
        let mut object = Map::new();
        object.insert(
            "ts".to_owned(),
            Value::String(self.ts.to_rfc3339_opts(SecondsFormat::Micros, true)),
        );
        object.insert("type".to_owned(), Value::String(self.kind.as_str().to_owned()));
        object.insert("ok".to_owned(), Value::Bool(self.ok));
        for (name, value) in &self.fields {
            object.insert(name.clone(), value.clone());
        }

        Value::Object(object).to_string()
    }
}

/// Renders a raw JSON log line as `<ts> <type> key=value ...`.
///
/// Lines that are not JSON objects are returned unchanged.
#[must_use]
pub fn render_text_line(raw: &str) -> String {
    let Ok(Value::Object(object)) = serde_json::from_str::<Value>(raw) else {
        return raw.to_owned();
    };

    let mut parts = Vec::with_capacity(object.len());
    for name in ["ts", "type"] {
        if let Some(value) = object.get(name) {
            parts.push(plain_value(value));
        }
    }
    for (name, value) in &object {
        if name != "ts" && name != "type" {
            parts.push(format!("{name}={}", plain_value(value)));
        }
    }

    parts.join(" ")
}

fn plain_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
