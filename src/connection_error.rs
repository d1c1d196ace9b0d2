//! Connection error types for talking to monitored instances
//!
//! Every failure on the path between the collector and a store instance is
//! reported through [`ConnectionError`]. Callers decide whether a failure is
//! fatal (first dial of a supervisor) or transient (everything afterwards).

use std::time::Duration;
use thiserror::Error;

use crate::protocol::ProtocolError;

/// Errors that can occur while dialing or using an instance connection
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConnectionError {
    /// TCP connection failed
    #[error("failed to connect to {address}: {source}")]
    TcpConnect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// DNS resolution produced no usable address
    #[error("failed to resolve {address}")]
    DnsResolution { address: String },

    /// Dial did not complete within the configured timeout
    #[error("connecting to {address} timed out after {timeout:?}")]
    ConnectTimeout { address: String, timeout: Duration },

    /// I/O error on an established connection
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Peer closed the connection
    #[error("connection closed by {address}")]
    Closed { address: String },

    /// Peer sent bytes that are not a valid reply
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Peer answered a command with an error reply
    #[error("{command} rejected by server: {message}")]
    ServerError { command: String, message: String },

    /// Peer answered with a reply of an unexpected shape
    #[error("unexpected reply to {command}: {reply}")]
    UnexpectedReply { command: String, reply: String },

    /// Liveness round-trip failed or timed out
    #[error("liveness check against {address} failed: {reason}")]
    Unhealthy { address: String, reason: String },

    /// Connection pool could not hand out a connection
    #[error("connection pool for {address}: {reason}")]
    Pool { address: String, reason: String },
}

impl ConnectionError {
    /// Check whether this error means the connection itself is unusable
    ///
    /// Server error replies leave the connection intact; everything else
    /// requires a fresh connection.
    #[must_use]
    pub fn is_connection_lost(&self) -> bool {
        !matches!(self, Self::ServerError { .. } | Self::UnexpectedReply { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_address() {
        let err = ConnectionError::TcpConnect {
            address: "127.0.0.1:6379".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        };
        let msg = err.to_string();
        assert!(msg.contains("127.0.0.1:6379"));
        assert!(msg.contains("refused"));
    }

    #[test]
    fn test_server_error_keeps_connection() {
        let err = ConnectionError::ServerError {
            command: "CONFIG SET".to_string(),
            message: "ERR Invalid argument".to_string(),
        };
        assert!(!err.is_connection_lost());
    }

    #[test]
    fn test_closed_is_connection_lost() {
        let err = ConnectionError::Closed {
            address: "127.0.0.1:6380".to_string(),
        };
        assert!(err.is_connection_lost());
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        let err: ConnectionError = io.into();
        assert!(matches!(err, ConnectionError::Io(_)));
        assert!(err.is_connection_lost());
    }
}
