use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use pokebot_application::{HttpRequestLabels, MetricsRecorder, MetricsSnapshot};
use tokio::sync::RwLock;

/// Process-local counters, reset on restart.
#[derive(Debug, Default)]
pub struct InMemoryMetricsRecorder {
    decisions_total: AtomicU64,
    purchases_total: AtomicU64,
    purchases_amount_usd_bits: AtomicU64,
    http_requests: RwLock<HashMap<HttpRequestLabels, u64>>,
}

impl InMemoryMetricsRecorder {
    /// Creates a recorder with every counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetricsRecorder for InMemoryMetricsRecorder {
    async fn record_http_request(&self, labels: HttpRequestLabels) {
        *self.http_requests.write().await.entry(labels).or_insert(0) += 1;
    }

    async fn record_decision(&self) {
        self.decisions_total.fetch_add(1, Ordering::Relaxed);
    }

    async fn record_purchase(&self, amount_usd: Option<f64>) {
        self.purchases_total.fetch_add(1, Ordering::Relaxed);

        if let Some(amount) = amount_usd.filter(|amount| amount.is_finite()) {
            // The closure always returns `Some`, so the update cannot fail.
            let _ = self.purchases_amount_usd_bits.fetch_update(
                Ordering::Relaxed,
                Ordering::Relaxed,
                |bits| Some((f64::from_bits(bits) + amount).to_bits()),
            );
        }
    }

    async fn snapshot(&self) -> MetricsSnapshot {
        let mut http_requests: Vec<(HttpRequestLabels, u64)> = self
            .http_requests
            .read()
            .await
            .iter()
            .map(|(labels, count)| (labels.clone(), *count))
            .collect();
        http_requests.sort();

        MetricsSnapshot {
            decisions_total: self.decisions_total.load(Ordering::Relaxed),
            purchases_total: self.purchases_total.load(Ordering::Relaxed),
            purchases_amount_usd: f64::from_bits(
                self.purchases_amount_usd_bits.load(Ordering::Relaxed),
            ),
            http_requests,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pokebot_application::{HttpRequestLabels, MetricsRecorder};

    use super::InMemoryMetricsRecorder;

    fn labels(path: &str, status: u16) -> HttpRequestLabels {
        HttpRequestLabels {
            method: "GET".to_owned(),
            path: path.to_owned(),
            status,
        }
    }

    #[tokio::test]
    async fn starts_at_zero() {
        let snapshot = InMemoryMetricsRecorder::new().snapshot().await;

        assert_eq!(snapshot.decisions_total, 0);
        assert_eq!(snapshot.purchases_total, 0);
        assert_eq!(snapshot.purchases_amount_usd, 0.0);
        assert!(snapshot.http_requests.is_empty());
    }

    #[tokio::test]
    async fn http_requests_are_grouped_and_sorted() {
        let recorder = InMemoryMetricsRecorder::new();

        recorder.record_http_request(labels("/metrics", 200)).await;
        recorder.record_http_request(labels("/healthz", 200)).await;
        recorder.record_http_request(labels("/metrics", 200)).await;

        let snapshot = recorder.snapshot().await;
        assert_eq!(
            snapshot.http_requests,
            vec![(labels("/healthz", 200), 1), (labels("/metrics", 200), 2)]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_purchases_are_all_counted() {
        let recorder = Arc::new(InMemoryMetricsRecorder::new());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let recorder = recorder.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..50 {
                    recorder.record_purchase(Some(0.5)).await;
                }
                recorder.record_purchase(None).await;
                recorder.record_decision().await;
            }));
        }
        for handle in handles {
            assert!(handle.await.is_ok());
        }

        let snapshot = recorder.snapshot().await;
        assert_eq!(snapshot.purchases_total, 408);
        assert_eq!(snapshot.decisions_total, 8);
        assert!((snapshot.purchases_amount_usd - 200.0).abs() < 1e-9);
    }
}
