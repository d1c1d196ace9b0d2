//! Metrics transport
//!
//! The flush task hands every counter to a [`MetricsSink`] as a
//! `(metric name, value)` pair.

mod graphite;
mod simulated;

pub use graphite::{GraphiteSink, format_line};
pub use simulated::SimulatedSink;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::GraphiteSettings;

/// Destination for flushed counter values
#[async_trait]
pub trait MetricsSink: Send + Sync + std::fmt::Debug {
    /// Send one metric value
    async fn send(&self, name: &str, value: &str) -> Result<()>;
}

/// Build the sink selected by the configuration
///
/// # Errors
/// Fails when Graphite is selected and cannot be reached.
pub async fn from_settings(settings: &GraphiteSettings) -> Result<Arc<dyn MetricsSink>> {
    if settings.simulate {
        tracing::info!("Simulating metric sends; nothing is sent to Graphite");
        Ok(Arc::new(SimulatedSink::new()))
    } else {
        let sink = GraphiteSink::connect(settings.host.as_str(), settings.port.get()).await?;
        Ok(Arc::new(sink))
    }
}
