//! Default values for configuration fields
//!
//! Used by the serde `default = "..."` attributes and the `Default` impls.

use std::time::Duration;

use crate::constants::{collector, metrics, pool, stats};
use crate::types::{HostName, MaxConnections, Port};

#[inline]
pub fn graphite_host() -> HostName {
    HostName::new(metrics::GRAPHITE_HOST.to_string()).unwrap_or_else(|_| HostName::loopback())
}

#[inline]
pub fn graphite_port() -> Port {
    Port::GRAPHITE
}

/// Metrics are logged rather than sent unless explicitly turned off
#[inline]
pub fn simulate() -> bool {
    true
}

#[inline]
pub fn metric_prefix() -> String {
    metrics::DEFAULT_PREFIX.to_string()
}

#[inline]
pub fn flush_interval() -> Duration {
    metrics::FLUSH_INTERVAL
}

#[inline]
pub fn role_check_interval() -> Duration {
    collector::ROLE_CHECK_INTERVAL
}

#[inline]
pub fn reconnect_delay() -> Duration {
    collector::RECONNECT_DELAY
}

#[inline]
pub fn idle_poll_interval() -> Duration {
    collector::IDLE_POLL_INTERVAL
}

#[inline]
pub fn configure_notifications() -> bool {
    true
}

#[inline]
pub fn max_connections() -> MaxConnections {
    MaxConnections::DEFAULT
}

#[inline]
pub fn idle_timeout() -> Duration {
    pool::IDLE_TIMEOUT
}

#[inline]
pub fn connect_timeout() -> Duration {
    pool::CONNECT_TIMEOUT
}

#[inline]
pub fn stats_listen() -> String {
    stats::LISTEN.to_string()
}
