//! Pub/sub frame recognition

use super::RespValue;

/// A frame received on a connection that is in subscriber mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PubSubMessage {
    /// Acknowledgement of a `SUBSCRIBE`/`PSUBSCRIBE`, with the number of active subscriptions
    Subscribed { target: String, count: i64 },
    /// A published message, delivered through `pattern` when it came from a pattern subscription
    Message {
        pattern: Option<String>,
        channel: String,
        payload: String,
    },
}

impl PubSubMessage {
    /// Recognise a pub/sub frame, returning `None` for anything else
    #[must_use]
    pub fn from_reply(value: &RespValue) -> Option<Self> {
        let items = value.as_array()?;
        let kind = items.first()?.as_text()?;

        match (kind.to_ascii_lowercase().as_str(), items.len()) {
            ("psubscribe" | "subscribe", 3) => match &items[2] {
                RespValue::Integer(count) => Some(Self::Subscribed {
                    target: items[1].as_text()?,
                    count: *count,
                }),
                _ => None,
            },
            ("pmessage", 4) => Some(Self::Message {
                pattern: Some(items[1].as_text()?),
                channel: items[2].as_text()?,
                payload: items[3].as_text()?,
            }),
            ("message", 3) => Some(Self::Message {
                pattern: None,
                channel: items[1].as_text()?,
                payload: items[2].as_text()?,
            }),
            _ => None,
        }
    }
}
