//! Key-space notifications
//!
//! Turning list notifications on for an instance, and recognising the
//! notifications that represent queue traffic.

pub mod classifier;
pub mod configurator;

pub use classifier::{ClassifiedEvent, ListOperation, classify, keyspace_key};
pub use configurator::{
    NotificationPlan, REQUIRED_FLAGS, ensure_list_events_enabled, list_events_enabled, plan,
};
