//! Queue throughput metrics from key-space notifications
//!
//! Each monitored instance gets a [`supervisor::Supervisor`] that subscribes
//! to `__keyspace@*` and counts list pushes and pops per queue while the
//! instance is a master. A single flush task periodically sends the
//! cumulative counts to Graphite (or logs them in simulate mode).

pub mod args;
pub mod collector;
pub mod config;
pub mod connection_error;
pub mod constants;
pub mod discovery;
pub mod flush;
pub mod keyspace;
pub mod logging;
pub mod metrics;
pub mod pool;
pub mod protocol;
pub mod role;
pub mod runtime;
pub mod sink;
pub mod stats_server;
pub mod supervisor;
pub mod types;

pub use args::Args;
pub use collector::Collector;
pub use config::{Config, load_config};
pub use connection_error::ConnectionError;
pub use keyspace::{ClassifiedEvent, ListOperation, classify};
pub use metrics::{CounterKey, CounterStore};
pub use runtime::{RuntimeConfig, shutdown_signal};
pub use supervisor::{Supervisor, SupervisorState};
