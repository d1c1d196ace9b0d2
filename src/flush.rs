//! Periodic flush of counters to the metrics sink

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::constants::metrics::UNKNOWN_HOST;
use crate::metrics::{CounterKey, CounterStore};
use crate::sink::MetricsSink;

/// This host's name as a single metric path segment
#[must_use]
pub fn host_label() -> String {
    nix::unistd::gethostname()
        .ok()
        .and_then(|name| name.into_string().ok())
        .filter(|name| !name.is_empty())
        .map(|name| sanitize_host(&name))
        .unwrap_or_else(|| UNKNOWN_HOST.to_string())
}

/// Replace the dots of a host name so it occupies one path segment
#[must_use]
pub fn sanitize_host(name: &str) -> String {
    name.replace('.', "_")
}

/// `<prefix>.<host>.<instance>.<queue>.<operation>`
#[must_use]
pub fn metric_name(prefix: &str, host: &str, key: &CounterKey) -> String {
    format!("{}.{}.{}", prefix, host, key.metric_path())
}

/// Sends every counter's cumulative value to a sink on a fixed interval
#[derive(Debug, Clone)]
pub struct Flusher {
    store: CounterStore,
    sink: Arc<dyn MetricsSink>,
    prefix: String,
    host: String,
}

impl Flusher {
    #[must_use]
    pub fn new(
        store: CounterStore,
        sink: Arc<dyn MetricsSink>,
        prefix: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            store,
            sink,
            prefix: prefix.into(),
            host: host.into(),
        }
    }

    /// Send one value per counter, returning how many sends succeeded
    ///
    /// A failed send is logged and the remaining counters are still sent.
    /// Counters are never reset.
    pub async fn flush_once(&self) -> usize {
        let snapshot = self.store.snapshot();
        let mut sent = 0;
        let mut failed = 0;

        for (key, value) in &snapshot.counters {
            let name = metric_name(&self.prefix, &self.host, key);
            match self.sink.send(&name, &value.to_string()).await {
                Ok(()) => sent += 1,
                Err(e) => {
                    failed += 1;
                    warn!("Failed to send {}: {:#}", name, e);
                }
            }
        }

        if failed > 0 {
            warn!("Flushed {} of {} counters", sent, snapshot.len());
        } else {
            debug!("Flushed {} counters", sent);
        }
        sent
    }

    /// Flush every `interval`, forever
    ///
    /// The first flush happens one full interval after start.
    pub async fn run(self, interval: Duration) {
        info!("Flushing counters every {:?}", interval);
        let mut ticker = time::interval_at(time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.flush_once().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyspace::ListOperation;
    use crate::types::InstanceAddr;

    #[test]
    fn test_sanitize_host() {
        assert_eq!(sanitize_host("web1.example.com"), "web1_example_com");
        assert_eq!(sanitize_host("web1"), "web1");
    }

    #[test]
    fn test_host_label_has_no_dots() {
        let label = host_label();
        assert!(!label.is_empty());
        assert!(!label.contains('.'));
    }

    #[test]
    fn test_metric_name_layout() {
        let key = CounterKey::new(
            "6379".parse::<InstanceAddr>().unwrap(),
            "orders".into(),
            ListOperation::LPush,
        );
        assert_eq!(
            metric_name("scouter", "web1", &key),
            "scouter.web1.6379.orders.lpush"
        );

        let remote = CounterKey::new(
            "10.0.0.5:6380".parse::<InstanceAddr>().unwrap(),
            "jobs.high".into(),
            ListOperation::BRPop,
        );
        assert_eq!(
            metric_name("scouter", "web1", &remote),
            "scouter.web1.10_0_0_5_6380.jobs%2Ehigh.brpop"
        );
    }
}
