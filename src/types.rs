//! Core domain types
//!
//! Validated configuration values, instance addressing and queue naming.

pub mod config;
pub mod instance;
pub mod queue;
pub mod validated;

pub use config::{MaxConnections, Port, ThreadCount, duration_serde, parse_duration};
pub use instance::InstanceAddr;
pub use queue::QueueName;
pub use validated::{ConfigPath, HostName, ValidationError};
