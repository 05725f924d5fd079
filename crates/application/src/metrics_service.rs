//! Operational counters and their Prometheus text exposition.
//!
//! Counters are best-effort and process-local: they start at zero on boot
//! and are never persisted.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;

/// Label set of the per-request HTTP counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HttpRequestLabels {
    /// Request method.
    pub method: String,
    /// Matched route template, or the raw path when no route matched.
    pub path: String,
    /// Response status code.
    pub status: u16,
}

/// Point-in-time copy of every counter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSnapshot {
    /// Decisions stored since boot.
    pub decisions_total: u64,
    /// Purchases stored since boot.
    pub purchases_total: u64,
    /// Sum of purchase amounts in USD since boot.
    pub purchases_amount_usd: f64,
    /// HTTP request counts, sorted by labels.
    pub http_requests: Vec<(HttpRequestLabels, u64)>,
}

impl MetricsSnapshot {
    /// Renders the snapshot in the Prometheus text exposition format.
    #[must_use]
    pub fn to_prometheus_text(&self) -> String {
        let mut out = String::new();

        write_counter(
            &mut out,
            "pokebot_decisions_total",
            "Total number of decisions stored",
            &self.decisions_total.to_string(),
        );
        write_counter(
            &mut out,
            "pokebot_purchases_total",
            "Total number of purchases stored",
            &self.purchases_total.to_string(),
        );
        write_counter(
            &mut out,
            "pokebot_purchases_amount_usd",
            "Sum of purchase amounts in USD",
            &format!("{:.2}", self.purchases_amount_usd),
        );

        out.push_str(
            "# HELP pokebot_http_requests_total HTTP requests by method, path and status\n",
        );
        out.push_str("# TYPE pokebot_http_requests_total counter\n");
        for (labels, count) in &self.http_requests {
            let _ = writeln!(
                out,
                "pokebot_http_requests_total{{method=\"{}\",path=\"{}\",status=\"{}\"}} {count}",
                escape_label(&labels.method),
                escape_label(&labels.path),
                labels.status,
            );
        }

        out
    }
}

fn write_counter(out: &mut String, name: &str, help: &str, value: &str) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} counter");
    let _ = writeln!(out, "{name} {value}");
}

fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Port for counter storage.
#[async_trait]
pub trait MetricsRecorder: Send + Sync {
    /// Counts one finished HTTP request.
    async fn record_http_request(&self, labels: HttpRequestLabels);

    /// Counts one stored decision.
    async fn record_decision(&self);

    /// Counts one stored purchase and adds its amount, when known.
    async fn record_purchase(&self, amount_usd: Option<f64>);

    /// Returns a copy of every counter.
    async fn snapshot(&self) -> MetricsSnapshot;
}

/// Application service for operational counters.
#[derive(Clone)]
pub struct MetricsService {
    recorder: Arc<dyn MetricsRecorder>,
}

impl MetricsService {
    /// Creates a service from a recorder implementation.
    #[must_use]
    pub fn new(recorder: Arc<dyn MetricsRecorder>) -> Self {
        Self { recorder }
    }

    /// Counts one finished HTTP request.
    pub async fn record_http_request(
        &self,
        method: impl Into<String>,
        path: impl Into<String>,
        status: u16,
    ) {
        self.recorder
            .record_http_request(HttpRequestLabels {
                method: method.into(),
                path: path.into(),
                status,
            })
            .await;
    }

    /// Counts one stored decision.
    pub async fn record_decision(&self) {
        self.recorder.record_decision().await;
    }

    /// Counts one stored purchase.
    pub async fn record_purchase(&self, amount_usd: Option<f64>) {
        self.recorder.record_purchase(amount_usd).await;
    }

    /// Returns the current counters.
    pub async fn snapshot(&self) -> MetricsSnapshot {
        self.recorder.snapshot().await
    }
}
