//! Connection management for monitored instances
//!
//! Each instance gets its own deadpool-backed [`InstancePool`]. Connections
//! are PING-checked before reuse and idle ones are reaped in the background.

mod connection;
mod manager;
mod provider;

pub use connection::RespConnection;
pub use manager::RespManager;
pub use provider::{Builder, InstancePool, PoolStatus, PooledConnection};
