//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::defaults;
use crate::types::{HostName, InstanceAddr, MaxConnections, Port, duration_serde};

/// Complete collector configuration
///
/// Every section is optional in the TOML file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub graphite: GraphiteSettings,
    #[serde(default)]
    pub metrics: MetricsSettings,
    #[serde(default)]
    pub collector: CollectorSettings,
    #[serde(default)]
    pub pool: PoolSettings,
    #[serde(default)]
    pub stats: StatsSettings,
    /// Instances to monitor; discovered from running processes when empty
    #[serde(default)]
    pub instances: Vec<InstanceAddr>,
}

/// Where metrics go
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphiteSettings {
    #[serde(default = "defaults::graphite_host")]
    pub host: HostName,
    #[serde(default = "defaults::graphite_port")]
    pub port: Port,
    /// Log metrics instead of sending them
    #[serde(default = "defaults::simulate")]
    pub simulate: bool,
}

impl Default for GraphiteSettings {
    fn default() -> Self {
        Self {
            host: defaults::graphite_host(),
            port: defaults::graphite_port(),
            simulate: defaults::simulate(),
        }
    }
}

/// Metric naming and flush cadence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSettings {
    #[serde(default = "defaults::metric_prefix")]
    pub prefix: String,
    #[serde(with = "duration_serde", default = "defaults::flush_interval")]
    pub flush_interval: Duration,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            prefix: defaults::metric_prefix(),
            flush_interval: defaults::flush_interval(),
        }
    }
}

/// Per-instance supervisor timing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollectorSettings {
    /// How often the replication role is polled
    #[serde(with = "duration_serde", default = "defaults::role_check_interval")]
    pub role_check_interval: Duration,
    /// Pause before each reconnect attempt
    #[serde(with = "duration_serde", default = "defaults::reconnect_delay")]
    pub reconnect_delay: Duration,
    /// Longest wait on the subscription while collection is paused
    #[serde(with = "duration_serde", default = "defaults::idle_poll_interval")]
    pub idle_poll_interval: Duration,
    /// Turn on list notifications after each subscription
    #[serde(default = "defaults::configure_notifications")]
    pub configure_notifications: bool,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            role_check_interval: defaults::role_check_interval(),
            reconnect_delay: defaults::reconnect_delay(),
            idle_poll_interval: defaults::idle_poll_interval(),
            configure_notifications: defaults::configure_notifications(),
        }
    }
}

/// Connection pool limits, applied to every instance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoolSettings {
    #[serde(default = "defaults::max_connections")]
    pub max_size: MaxConnections,
    #[serde(with = "duration_serde", default = "defaults::idle_timeout")]
    pub idle_timeout: Duration,
    #[serde(with = "duration_serde", default = "defaults::connect_timeout")]
    pub connect_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_size: defaults::max_connections(),
            idle_timeout: defaults::idle_timeout(),
            connect_timeout: defaults::connect_timeout(),
        }
    }
}

/// Diagnostic HTTP endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "defaults::stats_listen")]
    pub listen: String,
}

impl Default for StatsSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            listen: defaults::stats_listen(),
        }
    }
}
