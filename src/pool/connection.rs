//! A single request/reply connection to a store instance
//!
//! [`RespConnection`] owns a tuned TCP stream plus a reply buffer. Socket
//! reads append to the buffer and [`parse`](crate::protocol::parse) consumes
//! whole replies from its front, so a read cancelled by a timeout never loses
//! bytes already received.

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::trace;

use crate::connection_error::ConnectionError;
use crate::constants::socket::{
    KEEPALIVE_INTERVAL_SECS, KEEPALIVE_TIME_SECS, READ_CHUNK, RECV_BUFFER, SEND_BUFFER,
};
use crate::protocol::{PubSubMessage, RespValue, commands, encode_command, parse};
use crate::types::InstanceAddr;

/// Connection speaking the store's request/reply protocol
#[derive(Debug)]
pub struct RespConnection {
    stream: TcpStream,
    buffer: Vec<u8>,
    instance: InstanceAddr,
}

impl RespConnection {
    /// Dial an instance with keepalive and low-latency socket options
    pub async fn connect(
        instance: &InstanceAddr,
        timeout: Duration,
    ) -> Result<Self, ConnectionError> {
        let address = instance.dial_target();
        let stream = tokio::time::timeout(timeout, create_tuned_tcp_stream(&address))
            .await
            .map_err(|_| ConnectionError::ConnectTimeout {
                address: address.clone(),
                timeout,
            })??;

        Ok(Self {
            stream,
            buffer: Vec::with_capacity(READ_CHUNK),
            instance: instance.clone(),
        })
    }

    /// Instance this connection talks to
    #[must_use]
    pub fn instance(&self) -> &InstanceAddr {
        &self.instance
    }

    /// Write one command without waiting for its reply
    pub async fn send<S: AsRef<[u8]>>(&mut self, args: &[S]) -> Result<(), ConnectionError> {
        let frame = encode_command(args);
        self.stream.write_all(&frame).await?;
        Ok(())
    }

    /// Read the next complete reply
    ///
    /// Cancel-safe: partial input stays buffered for the next call.
    pub async fn read_reply(&mut self) -> Result<RespValue, ConnectionError> {
        loop {
            if let Some((value, consumed)) = parse(&self.buffer)? {
                self.buffer.drain(..consumed);
                return Ok(value);
            }

            let mut chunk = [0u8; READ_CHUNK];
            let n = self.stream.read(&mut chunk).await?;
            if n == 0 {
                return Err(ConnectionError::Closed {
                    address: self.instance.to_string(),
                });
            }
            trace!("Read {} bytes from {}", n, self.instance);
            self.buffer.extend_from_slice(&chunk[..n]);
        }
    }

    /// Send a command and wait for its reply, turning error replies into errors
    pub async fn request<S: AsRef<[u8]>>(
        &mut self,
        args: &[S],
    ) -> Result<RespValue, ConnectionError> {
        self.send(args).await?;
        match self.read_reply().await? {
            RespValue::Error(message) => Err(ConnectionError::ServerError {
                command: command_name(args),
                message,
            }),
            reply => Ok(reply),
        }
    }

    /// Liveness round-trip
    pub async fn ping(&mut self) -> Result<(), ConnectionError> {
        match self.request(&commands::ping()).await? {
            RespValue::Simple(s) if s.eq_ignore_ascii_case("PONG") => Ok(()),
            other => Err(ConnectionError::UnexpectedReply {
                command: "PING".to_string(),
                reply: other.to_string(),
            }),
        }
    }

    /// Read a configuration parameter, `None` when the server does not know it
    pub async fn config_get(&mut self, parameter: &str) -> Result<Option<String>, ConnectionError> {
        let reply = self.request(&commands::config_get(parameter)).await?;
        if reply.as_array().is_none() {
            return Err(ConnectionError::UnexpectedReply {
                command: format!("CONFIG GET {}", parameter),
                reply: reply.to_string(),
            });
        }
        Ok(commands::config_get_value(&reply, parameter))
    }

    /// Write a configuration parameter
    pub async fn config_set(&mut self, parameter: &str, value: &str) -> Result<(), ConnectionError> {
        let reply = self.request(&commands::config_set(parameter, value)).await?;
        if reply.is_ok() {
            Ok(())
        } else {
            Err(ConnectionError::UnexpectedReply {
                command: format!("CONFIG SET {}", parameter),
                reply: reply.to_string(),
            })
        }
    }

    /// Read the next pub/sub frame, skipping anything that is not one
    pub async fn next_pubsub(&mut self) -> Result<PubSubMessage, ConnectionError> {
        loop {
            let reply = self.read_reply().await?;
            match PubSubMessage::from_reply(&reply) {
                Some(message) => return Ok(message),
                None => trace!("Ignoring non pub/sub frame from {}: {}", self.instance, reply),
            }
        }
    }
}

fn command_name<S: AsRef<[u8]>>(args: &[S]) -> String {
    args.first()
        .map(|a| String::from_utf8_lossy(a.as_ref()).to_ascii_uppercase())
        .unwrap_or_default()
}

/// Create a TCP stream with keepalive, no-delay and bounded buffers using socket2
async fn create_tuned_tcp_stream(address: &str) -> Result<TcpStream, ConnectionError> {
    use socket2::{Domain, Protocol, SockRef, Socket, TcpKeepalive, Type};

    let socket_addr = tokio::net::lookup_host(address)
        .await
        .map_err(|source| ConnectionError::TcpConnect {
            address: address.to_string(),
            source,
        })?
        .next()
        .ok_or_else(|| ConnectionError::DnsResolution {
            address: address.to_string(),
        })?;

    let domain = if socket_addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };
    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_recv_buffer_size(RECV_BUFFER)?;
    socket.set_send_buffer_size(SEND_BUFFER)?;
    socket.set_nonblocking(true)?;

    let std_stream: std::net::TcpStream = socket.into();
    let tokio_socket = tokio::net::TcpSocket::from_std_stream(std_stream);
    let stream = tokio_socket
        .connect(socket_addr)
        .await
        .map_err(|source| ConnectionError::TcpConnect {
            address: address.to_string(),
            source,
        })?;

    // Keepalive catches peers that vanish without a FIN while the subscriber is idle
    let keepalive = TcpKeepalive::new()
        .with_time(Duration::from_secs(KEEPALIVE_TIME_SECS))
        .with_interval(Duration::from_secs(KEEPALIVE_INTERVAL_SECS));
    let sock_ref = SockRef::from(&stream);
    sock_ref.set_tcp_keepalive(&keepalive)?;
    sock_ref.set_tcp_nodelay(true)?;

    Ok(stream)
}
