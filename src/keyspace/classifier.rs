//! Classification of key-space notifications into queue operations

use std::fmt;

use crate::constants::keyspace::{CHANNEL_PREFIX, KEY_SEPARATOR};
use crate::types::QueueName;

/// List-mutating commands that count as queue traffic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ListOperation {
    LPush,
    LPushX,
    RPush,
    RPushX,
    LPop,
    BLPop,
    RPop,
    BRPop,
}

impl ListOperation {
    /// Every counted operation
    pub const ALL: [ListOperation; 8] = [
        Self::LPush,
        Self::LPushX,
        Self::RPush,
        Self::RPushX,
        Self::LPop,
        Self::BLPop,
        Self::RPop,
        Self::BRPop,
    ];

    /// Notification payload and metric segment for this operation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LPush => "lpush",
            Self::LPushX => "lpushx",
            Self::RPush => "rpush",
            Self::RPushX => "rpushx",
            Self::LPop => "lpop",
            Self::BLPop => "blpop",
            Self::RPop => "rpop",
            Self::BRPop => "brpop",
        }
    }

    /// Match a notification payload exactly
    #[must_use]
    pub fn from_payload(payload: &str) -> Option<Self> {
        match payload {
            "lpush" => Some(Self::LPush),
            "lpushx" => Some(Self::LPushX),
            "rpush" => Some(Self::RPush),
            "rpushx" => Some(Self::RPushX),
            "lpop" => Some(Self::LPop),
            "blpop" => Some(Self::BLPop),
            "rpop" => Some(Self::RPop),
            "brpop" => Some(Self::BRPop),
            _ => None,
        }
    }
}

impl fmt::Display for ListOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notification recognised as a queue operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedEvent {
    pub queue: QueueName,
    pub operation: ListOperation,
}

/// Extract the key from a `__keyspace@<db>__:<key>` channel
///
/// The database number must be all digits and the key non-empty. The key is
/// everything after the first separator, so keys containing `__:` survive.
#[must_use]
pub fn keyspace_key(channel: &str) -> Option<&str> {
    let rest = channel.strip_prefix(CHANNEL_PREFIX)?;
    let sep = rest.find(KEY_SEPARATOR)?;
    let (db, key) = (&rest[..sep], &rest[sep + KEY_SEPARATOR.len()..]);
    if db.is_empty() || !db.bytes().all(|b| b.is_ascii_digit()) || key.is_empty() {
        return None;
    }
    Some(key)
}

/// Classify a (channel, payload) pair
///
/// Returns `None` unless the channel is a key-space channel and the payload
/// names one of the counted list operations.
///
/// ```
/// use queue_scouter::keyspace::{ListOperation, classify};
///
/// let event = classify("__keyspace@0__:orders", "lpush").unwrap();
/// assert_eq!(event.queue.as_str(), "orders");
/// assert_eq!(event.operation, ListOperation::LPush);
///
/// assert!(classify("__keyspace@0__:orders", "get").is_none());
/// assert!(classify("__keyevent@0__:lpush", "orders").is_none());
/// ```
#[must_use]
pub fn classify(channel: &str, payload: &str) -> Option<ClassifiedEvent> {
    let operation = ListOperation::from_payload(payload)?;
    let key = keyspace_key(channel)?;
    Some(ClassifiedEvent {
        queue: QueueName::from(key),
        operation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_operations_classify() {
        for op in ListOperation::ALL {
            let event = classify("__keyspace@0__:jobs", op.as_str()).unwrap();
            assert_eq!(event.operation, op);
            assert_eq!(event.queue.as_str(), "jobs");
        }
    }

    #[test]
    fn test_non_list_payloads_rejected() {
        for payload in ["get", "set", "del", "expired", "lset", "ltrim", "linsert", "rpoplpush", ""] {
            assert!(classify("__keyspace@0__:jobs", payload).is_none(), "{payload}");
        }
    }

    #[test]
    fn test_payload_match_is_exact() {
        assert!(classify("__keyspace@0__:jobs", "LPUSH").is_none());
        assert!(classify("__keyspace@0__:jobs", "lpush ").is_none());
        assert!(classify("__keyspace@0__:jobs", "xlpush").is_none());
    }

    #[test]
    fn test_channel_must_be_keyspace() {
        assert!(classify("__keyevent@0__:lpush", "lpush").is_none());
        assert!(classify("orders", "lpush").is_none());
        assert!(classify("__keyspace@0__:", "lpush").is_none());
        assert!(classify("__keyspace@__:orders", "lpush").is_none());
        assert!(classify("__keyspace@x__:orders", "lpush").is_none());
    }

    #[test]
    fn test_multi_digit_database() {
        let event = classify("__keyspace@15__:mail", "rpop").unwrap();
        assert_eq!(event.queue.as_str(), "mail");
    }

    #[test]
    fn test_key_keeps_separator_text() {
        assert_eq!(keyspace_key("__keyspace@0__:a__:b"), Some("a__:b"));
        assert_eq!(keyspace_key("__keyspace@0__:queue:high"), Some("queue:high"));
    }

    #[test]
    fn test_display_matches_payload() {
        assert_eq!(ListOperation::BRPop.to_string(), "brpop");
        assert_eq!(ListOperation::from_payload("rpushx"), Some(ListOperation::RPushX));
    }
}
