//! Commands issued to monitored instances
//!
//! The collector only ever needs a liveness check, configuration reads and
//! writes, and a pattern subscription. Each helper returns the argument list
//! for [`encode_command`](super::encode_command).

use super::RespValue;

/// Configuration parameter controlling which change notifications are published
pub const NOTIFY_KEYSPACE_EVENTS: &str = "notify-keyspace-events";

/// Configuration parameter naming the upstream of a replica
///
/// Still accepted as an alias of `replicaof` by current servers.
pub const REPLICA_OF: &str = "slaveof";

/// Pattern covering every key-space notification in every database
pub const KEYSPACE_PATTERN: &str = "__keyspace@*";

/// `PING`
#[inline]
#[must_use]
pub fn ping() -> [&'static str; 1] {
    ["PING"]
}

/// `CONFIG GET <parameter>`
#[inline]
#[must_use]
pub fn config_get(parameter: &str) -> [&str; 3] {
    ["CONFIG", "GET", parameter]
}

/// `CONFIG SET <parameter> <value>`
#[inline]
#[must_use]
pub fn config_set<'a>(parameter: &'a str, value: &'a str) -> [&'a str; 4] {
    ["CONFIG", "SET", parameter, value]
}

/// `PSUBSCRIBE <pattern>`
#[inline]
#[must_use]
pub fn psubscribe(pattern: &str) -> [&str; 2] {
    ["PSUBSCRIBE", pattern]
}

/// Extract the value from a `CONFIG GET <parameter>` reply
///
/// The reply is a flat array of name/value pairs. An empty array means the
/// parameter does not exist on this server, which is reported as `None`.
#[must_use]
pub fn config_get_value(reply: &RespValue, parameter: &str) -> Option<String> {
    let items = reply.as_array()?;
    items.chunks_exact(2).find_map(|pair| {
        let name = pair[0].as_text()?;
        if name.eq_ignore_ascii_case(parameter) {
            pair[1].as_text()
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::encode_command;

    fn bulk(s: &str) -> RespValue {
        RespValue::Bulk(Some(s.as_bytes().to_vec()))
    }

    #[test]
    fn test_ping_encoding() {
        assert_eq!(encode_command(&ping()), b"*1\r\n$4\r\nPING\r\n");
    }

    #[test]
    fn test_config_set_encoding() {
        let encoded = encode_command(&config_set(NOTIFY_KEYSPACE_EVENTS, "lK"));
        assert!(encoded.starts_with(b"*4\r\n$6\r\nCONFIG\r\n$3\r\nSET\r\n"));
        assert!(encoded.ends_with(b"$2\r\nlK\r\n"));
    }

    #[test]
    fn test_config_get_value_present() {
        let reply = RespValue::Array(Some(vec![bulk(REPLICA_OF), bulk("10.0.0.1 6379")]));
        assert_eq!(
            config_get_value(&reply, REPLICA_OF).as_deref(),
            Some("10.0.0.1 6379")
        );
    }

    #[test]
    fn test_config_get_value_empty_string() {
        let reply = RespValue::Array(Some(vec![bulk(NOTIFY_KEYSPACE_EVENTS), bulk("")]));
        assert_eq!(
            config_get_value(&reply, NOTIFY_KEYSPACE_EVENTS).as_deref(),
            Some("")
        );
    }

    #[test]
    fn test_config_get_value_absent() {
        let reply = RespValue::Array(Some(vec![]));
        assert_eq!(config_get_value(&reply, REPLICA_OF), None);
        assert_eq!(config_get_value(&RespValue::Integer(1), REPLICA_OF), None);
    }
}
