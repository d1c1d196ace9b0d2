//! Duration parsing and serialization for configuration files and flags
//!
//! Durations are accepted either as a bare integer number of seconds
//! (`flush_interval = 60`) or as a string with a unit suffix
//! (`role_check_interval = "500ms"`, `"5s"`, `"2m"`).

use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;

/// Parse a duration from `"<n>"`, `"<n>ms"`, `"<n>s"` or `"<n>m"`
///
/// A bare number is interpreted as seconds.
///
/// ```
/// use std::time::Duration;
/// use queue_scouter::types::parse_duration;
///
/// assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
/// assert_eq!(parse_duration("60").unwrap(), Duration::from_secs(60));
/// ```
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    let (digits, unit) = match s.find(|c: char| !c.is_ascii_digit()) {
        Some(idx) => s.split_at(idx),
        None => (s, "s"),
    };
    let value: u64 = digits
        .parse()
        .map_err(|_| format!("invalid duration '{}'", input))?;

    match unit.trim() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" | "" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value.saturating_mul(60))),
        other => Err(format!(
            "invalid duration unit '{}' in '{}' (expected ms, s or m)",
            other, input
        )),
    }
}

/// Serde helper: seconds as integer, or a suffixed string
pub mod duration_serde {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(u64),
        Text(String),
    }

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() == 0 {
            serializer.serialize_u64(duration.as_secs())
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Raw::deserialize(deserializer)? {
            Raw::Seconds(secs) => Ok(Duration::from_secs(secs)),
            Raw::Text(text) => parse_duration(&text).map_err(serde::de::Error::custom),
        }
    }
}
