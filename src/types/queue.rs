//! Queue naming

use derive_more::{AsRef, Deref, Display, From, Into};
use std::fmt::Write;

/// Name of a list key observed through key-space notifications
///
/// This newtype keeps queue names from being mixed up with instance labels
/// and operation names inside counter keys.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into, AsRef, Deref,
)]
pub struct QueueName(String);

impl QueueName {
    /// Create a queue name
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the raw name
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render the name as exactly one metric path segment
    ///
    /// Path separators, whitespace and `%` are percent-encoded byte by byte,
    /// so distinct queue names always render to distinct segments.
    ///
    /// ```
    /// use queue_scouter::types::QueueName;
    ///
    /// assert_eq!(QueueName::new("jobs.high").metric_segment(), "jobs%2Ehigh");
    /// assert_eq!(QueueName::new("jobs_high").metric_segment(), "jobs_high");
    /// ```
    #[must_use]
    pub fn metric_segment(&self) -> String {
        let mut segment = String::with_capacity(self.0.len());
        for c in self.0.chars() {
            if c == '.' || c == '%' || c.is_whitespace() {
                let mut utf8 = [0u8; 4];
                for byte in c.encode_utf8(&mut utf8).bytes() {
                    let _ = write!(segment, "%{:02X}", byte);
                }
            } else {
                segment.push(c);
            }
        }
        segment
    }
}

impl From<&str> for QueueName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_raw_name() {
        let queue = QueueName::new("jobs.high");
        assert_eq!(queue.to_string(), "jobs.high");
        assert_eq!(queue.as_str(), "jobs.high");
    }

    #[test]
    fn test_metric_segment_encodes_separators() {
        assert_eq!(QueueName::new("jobs.high").metric_segment(), "jobs%2Ehigh");
        assert_eq!(QueueName::new("mail out").metric_segment(), "mail%20out");
        assert_eq!(QueueName::new("tab\tq").metric_segment(), "tab%09q");
        assert_eq!(QueueName::new("100%").metric_segment(), "100%25");
        assert_eq!(QueueName::new("orders").metric_segment(), "orders");
        assert!(!QueueName::new("a.b.c").metric_segment().contains('.'));
    }

    #[test]
    fn test_metric_segment_is_injective() {
        let names = ["jobs.high", "jobs_high", "jobs high", "jobs%2Ehigh", "jobs%high"];
        let segments: std::collections::HashSet<String> = names
            .iter()
            .map(|n| QueueName::new(*n).metric_segment())
            .collect();
        assert_eq!(segments.len(), names.len());
    }

    #[test]
    fn test_deref_to_str() {
        let queue: QueueName = "orders".into();
        assert!(queue.starts_with("ord"));
    }
}
