//! Store wire protocol
//!
//! The monitored store speaks RESP2. This module contains a small incremental
//! codec for replies, request encoding, the handful of commands the collector
//! issues, and recognition of pub/sub frames.

pub mod commands;
mod pubsub;
mod resp;

pub use pubsub::PubSubMessage;
pub use resp::{MAX_DEPTH, ProtocolError, RespValue, encode_command, parse};
