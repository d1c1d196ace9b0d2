//! Queue operation aggregation
//!
//! Counters are keyed by (instance, queue, operation) and updated with
//! atomic adds, so supervisors never wait on each other or on a flush.

mod store;

pub use store::{CounterKey, CounterSnapshot, CounterStore};
