//! Command-line arguments
//!
//! Every flag can also come from an environment variable and overrides the
//! configuration file.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{Config, load_config_or_default};
use crate::types::{ConfigPath, HostName, InstanceAddr, Port, ThreadCount, parse_duration};

/// Collect per-queue list operation counts from key-space notifications
#[derive(Parser, Debug, Clone)]
#[command(name = "queue-scouter", version, about)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, env = "SCOUTER_CONFIG")]
    pub config: Option<ConfigPath>,

    /// Instances to monitor, e.g. `6379,6380` or `10.0.0.2:6379`
    ///
    /// When neither this nor the configuration file lists any instance, running
    /// server processes are discovered.
    #[arg(short, long, env = "SCOUTER_INSTANCES", value_delimiter = ',')]
    pub instances: Vec<InstanceAddr>,

    /// Graphite host
    #[arg(long, env = "SCOUTER_GRAPHITE_HOST")]
    pub graphite_host: Option<HostName>,

    /// Graphite plaintext port
    #[arg(long, env = "SCOUTER_GRAPHITE_PORT")]
    pub graphite_port: Option<Port>,

    /// Log metrics instead of sending them (`--simulate false` to send)
    #[arg(long, env = "SCOUTER_SIMULATE", num_args = 0..=1, default_missing_value = "true")]
    pub simulate: Option<bool>,

    /// Flush interval, e.g. `60`, `30s` or `1m`
    #[arg(long, env = "SCOUTER_INTERVAL", value_parser = parse_duration)]
    pub interval: Option<Duration>,

    /// Root segment of metric names
    #[arg(long, env = "SCOUTER_PREFIX")]
    pub prefix: Option<String>,

    /// Serve counters as JSON over HTTP
    #[arg(long, env = "SCOUTER_STATS")]
    pub stats: bool,

    /// Listen address of the stats endpoint
    #[arg(long, env = "SCOUTER_STATS_ADDR")]
    pub stats_addr: Option<String>,

    /// Also write logs to this file
    #[arg(long, env = "SCOUTER_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Worker threads (0 = one per CPU)
    #[arg(short, long, env = "SCOUTER_THREADS")]
    pub threads: Option<ThreadCount>,
}

impl Args {
    /// Overlay these flags on a configuration
    pub fn apply_to(&self, config: &mut Config) {
        if !self.instances.is_empty() {
            config.instances = self.instances.clone();
        }
        if let Some(host) = &self.graphite_host {
            config.graphite.host = host.clone();
        }
        if let Some(port) = self.graphite_port {
            config.graphite.port = port;
        }
        if let Some(simulate) = self.simulate {
            config.graphite.simulate = simulate;
        }
        if let Some(interval) = self.interval {
            config.metrics.flush_interval = interval;
        }
        if let Some(prefix) = &self.prefix {
            config.metrics.prefix = prefix.clone();
        }
        if self.stats {
            config.stats.enabled = true;
        }
        if let Some(addr) = &self.stats_addr {
            config.stats.enabled = true;
            config.stats.listen = addr.clone();
        }
    }

    /// Defaults, then the configuration file, then these flags
    pub fn resolve_config(&self) -> Result<Config> {
        let mut config = load_config_or_default(self.config.as_ref().map(|p| p.as_path()))?;
        self.apply_to(&mut config);
        config.validate()?;
        Ok(config)
    }
}
