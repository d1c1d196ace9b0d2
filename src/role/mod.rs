//! Replication role monitoring
//!
//! Only a master's notifications are counted: a replica receives the same
//! writes through replication and would double the numbers.

mod gate;
mod monitor;

pub use gate::CollectionGate;
pub use monitor::{ReplicationRole, RoleMonitor, RoleTracker, query_role};
