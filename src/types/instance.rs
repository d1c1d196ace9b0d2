//! Addressing of monitored store instances

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{HostName, Port, ValidationError};

/// Network address of one monitored store instance
///
/// Parsed from `"6379"`, `":6379"` or `"host:6379"`; the bare-port forms refer
/// to the local host.
///
/// # Examples
/// ```
/// use queue_scouter::types::InstanceAddr;
///
/// let local: InstanceAddr = "6380".parse().unwrap();
/// assert_eq!(local.to_string(), "127.0.0.1:6380");
/// assert_eq!(local.metric_label(), "6380");
///
/// let remote: InstanceAddr = "cache.internal:6379".parse().unwrap();
/// assert_eq!(remote.metric_label(), "cache_internal_6379");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceAddr {
    #[serde(default = "HostName::loopback")]
    pub host: HostName,
    pub port: Port,
}

impl InstanceAddr {
    /// Create an address from its parts
    #[must_use]
    pub fn new(host: HostName, port: Port) -> Self {
        Self { host, port }
    }

    /// Address of an instance on the local host
    #[must_use]
    pub fn local(port: Port) -> Self {
        Self::new(HostName::loopback(), port)
    }

    /// `host:port` string suitable for dialing
    #[must_use]
    pub fn dial_target(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Single metric path segment identifying this instance
    ///
    /// Local instances are identified by port alone; remote ones by host and
    /// port with path separators replaced.
    #[must_use]
    pub fn metric_label(&self) -> String {
        if self.host.is_loopback() {
            self.port.to_string()
        } else {
            let host: String = self
                .host
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
                .collect();
            format!("{}_{}", host, self.port)
        }
    }
}

impl fmt::Display for InstanceAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dial_target())
    }
}

impl FromStr for InstanceAddr {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || ValidationError::InvalidInstance(s.to_string());

        let Some((host, port)) = s.rsplit_once(':') else {
            return Ok(Self::local(s.parse().map_err(|_| invalid())?));
        };

        let port: Port = port.parse().map_err(|_| invalid())?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() || host == "*" {
            return Ok(Self::local(port));
        }
        let host = HostName::new(host.to_string()).map_err(|_| invalid())?;
        Ok(Self::new(host, port))
    }
}
