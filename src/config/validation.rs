//! Configuration validation
//!
//! Ports and pool sizes are already non-zero by type. This checks the
//! remaining semantic constraints.

use anyhow::{Result, bail};
use std::time::Duration;

use super::types::Config;

const MAX_RECOMMENDED_ROLE_CHECK: Duration = Duration::from_secs(60);
const MIN_RECOMMENDED_FLUSH: Duration = Duration::from_secs(1);

impl Config {
    /// Reject unusable values and warn about unusual ones
    pub fn validate(&self) -> Result<()> {
        let intervals = [
            ("metrics.flush_interval", self.metrics.flush_interval),
            ("collector.role_check_interval", self.collector.role_check_interval),
            ("collector.reconnect_delay", self.collector.reconnect_delay),
            ("collector.idle_poll_interval", self.collector.idle_poll_interval),
            ("pool.idle_timeout", self.pool.idle_timeout),
            ("pool.connect_timeout", self.pool.connect_timeout),
        ];
        for (name, value) in intervals {
            if value.is_zero() {
                bail!("{} must be greater than zero", name);
            }
        }

        if self.metrics.prefix.trim().is_empty() || self.metrics.prefix.contains(char::is_whitespace) {
            bail!("metrics.prefix must be non-empty and contain no whitespace");
        }

        if self.collector.role_check_interval > MAX_RECOMMENDED_ROLE_CHECK {
            tracing::warn!(
                "collector.role_check_interval is {:?}; a failover may be counted twice for that long",
                self.collector.role_check_interval
            );
        }
        if self.metrics.flush_interval < MIN_RECOMMENDED_FLUSH {
            tracing::warn!(
                "metrics.flush_interval is {:?}; this sends every counter more than once per second",
                self.metrics.flush_interval
            );
        }

        Ok(())
    }
}
