//! Per-instance collection switch

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Whether notifications from an instance are currently counted
///
/// Written only by the instance's role monitor, read by its consume loop.
/// Clones share the same flag. Starts open so counting begins before the
/// first role poll completes.
#[derive(Debug, Clone)]
pub struct CollectionGate {
    enabled: Arc<AtomicBool>,
}

impl CollectionGate {
    #[must_use]
    pub fn new() -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(true)),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Set the flag, returning the previous value
    pub fn set(&self, enabled: bool) -> bool {
        self.enabled.swap(enabled, Ordering::AcqRel)
    }
}

impl Default for CollectionGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_open() {
        assert!(CollectionGate::new().is_open());
    }

    #[test]
    fn test_clones_share_state() {
        let gate = CollectionGate::new();
        let reader = gate.clone();
        assert!(gate.set(false));
        assert!(!reader.is_open());
        assert!(!gate.set(true));
        assert!(reader.is_open());
    }

    #[tokio::test]
    async fn test_visible_across_tasks() {
        let gate = CollectionGate::new();
        let writer = gate.clone();
        tokio::spawn(async move { writer.set(false) }).await.unwrap();
        assert!(!gate.is_open());
    }
}
