//! Dry-run sink

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

use super::MetricsSink;

/// Logs metrics instead of sending them anywhere
#[derive(Debug, Default)]
pub struct SimulatedSink {
    sent: AtomicU64,
}

impl SimulatedSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Metrics "sent" so far
    #[must_use]
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl MetricsSink for SimulatedSink {
    async fn send(&self, name: &str, value: &str) -> anyhow::Result<()> {
        self.sent.fetch_add(1, Ordering::Relaxed);
        info!(metric = name, value, "simulated send");
        Ok(())
    }
}
