//! Graphite plaintext protocol sink

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::MetricsSink;
use crate::constants::pool::CONNECT_TIMEOUT;

/// Render one plaintext protocol line
#[must_use]
pub fn format_line(name: &str, value: &str, timestamp: u64) -> String {
    format!("{} {} {}\n", name, value, timestamp)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Sends metrics to a Graphite (carbon) listener over TCP
///
/// The connection is opened by [`GraphiteSink::connect`]. After a failed
/// write it is dropped and dialed again on the next send.
#[derive(Debug)]
pub struct GraphiteSink {
    address: String,
    stream: Mutex<Option<TcpStream>>,
}

impl GraphiteSink {
    /// Connect to `host:port`
    ///
    /// # Errors
    /// Fails when the listener cannot be reached.
    pub async fn connect(host: &str, port: u16) -> Result<Self> {
        let address = format!("{}:{}", host, port);
        let stream = dial(&address, CONNECT_TIMEOUT).await?;
        info!("Connected to Graphite at {}", address);
        Ok(Self {
            address,
            stream: Mutex::new(Some(stream)),
        })
    }
}

async fn dial(address: &str, timeout: Duration) -> Result<TcpStream> {
    let stream = tokio::time::timeout(timeout, TcpStream::connect(address))
        .await
        .with_context(|| format!("Timed out connecting to Graphite at {}", address))?
        .with_context(|| format!("Failed to connect to Graphite at {}", address))?;
    stream.set_nodelay(true)?;
    Ok(stream)
}

#[async_trait]
impl MetricsSink for GraphiteSink {
    async fn send(&self, name: &str, value: &str) -> Result<()> {
        let line = format_line(name, value, unix_now());
        let mut guard = self.stream.lock().await;

        if guard.is_none() {
            debug!("Reconnecting to Graphite at {}", self.address);
            *guard = Some(dial(&self.address, CONNECT_TIMEOUT).await?);
        }

        let written = match guard.as_mut() {
            Some(stream) => stream.write_all(line.as_bytes()).await,
            None => Ok(()),
        };
        if let Err(e) = written {
            warn!("Lost Graphite connection to {}: {}", self.address, e);
            *guard = None;
            return Err(e).with_context(|| format!("Failed to send {} to {}", name, self.address));
        }
        Ok(())
    }
}
