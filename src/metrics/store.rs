//! Lock-free queue operation counters

use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::keyspace::ListOperation;
use crate::types::{InstanceAddr, QueueName};

/// Identifies one counter
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CounterKey {
    pub instance: InstanceAddr,
    pub queue: QueueName,
    pub operation: ListOperation,
}

impl CounterKey {
    #[must_use]
    pub fn new(instance: InstanceAddr, queue: QueueName, operation: ListOperation) -> Self {
        Self {
            instance,
            queue,
            operation,
        }
    }

    /// `<instance label>.<queue>.<operation>`
    #[must_use]
    pub fn metric_path(&self) -> String {
        format!(
            "{}.{}.{}",
            self.instance.metric_label(),
            self.queue.metric_segment(),
            self.operation
        )
    }
}

/// Point-in-time copy of every counter, ordered by key
#[derive(Debug, Clone, Default)]
pub struct CounterSnapshot {
    pub counters: Vec<(CounterKey, u64)>,
}

impl CounterSnapshot {
    #[must_use]
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Value of one counter, zero if never incremented
    #[must_use]
    pub fn get(&self, key: &CounterKey) -> u64 {
        self.counters
            .binary_search_by(|(k, _)| k.cmp(key))
            .map(|i| self.counters[i].1)
            .unwrap_or(0)
    }

    /// Sum across all counters
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counters.iter().map(|(_, v)| v).sum()
    }
}

/// Cumulative counters shared by every supervisor and the flush task
///
/// Counts only ever grow and a key, once seen, is never removed. Cloning is
/// cheap; clones share the same table.
#[derive(Debug, Clone)]
pub struct CounterStore {
    inner: Arc<CounterInner>,
}

#[derive(Debug)]
struct CounterInner {
    counters: DashMap<CounterKey, AtomicU64>,
    started: Instant,
}

impl CounterStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CounterInner {
                counters: DashMap::new(),
                started: Instant::now(),
            }),
        }
    }

    /// Add one to a counter
    #[inline]
    pub fn increment(&self, key: CounterKey) {
        self.add(key, 1);
    }

    /// Add `n` to a counter
    pub fn add(&self, key: CounterKey, n: u64) {
        // Fast path: existing key under a shared shard lock
        if let Some(counter) = self.inner.counters.get(&key) {
            counter.fetch_add(n, Ordering::Relaxed);
            return;
        }
        self.inner
            .counters
            .entry(key)
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(n, Ordering::Relaxed);
    }

    /// Current value of one counter
    #[must_use]
    pub fn get(&self, key: &CounterKey) -> u64 {
        self.inner
            .counters
            .get(key)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Copy every counter
    ///
    /// Shards are locked one at a time for reading, so writers to other
    /// shards are never blocked and increments that finished before this call
    /// are always included.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        let mut counters: Vec<(CounterKey, u64)> = self
            .inner
            .counters
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().load(Ordering::Relaxed)))
            .collect();
        counters.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        CounterSnapshot { counters }
    }

    /// Number of distinct counters
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.counters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.counters.is_empty()
    }

    /// Time since the store was created
    #[must_use]
    pub fn uptime(&self) -> std::time::Duration {
        self.inner.started.elapsed()
    }
}

impl Default for CounterStore {
    fn default() -> Self {
        Self::new()
    }
}
