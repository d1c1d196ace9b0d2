//! deadpool manager for instance connections

use deadpool::managed;
use std::time::Duration;
use tracing::debug;

use super::connection::RespConnection;
use crate::connection_error::ConnectionError;
use crate::constants::pool::PING_TIMEOUT;
use crate::types::InstanceAddr;

/// Creates connections to one instance and checks them before reuse
#[derive(Debug)]
pub struct RespManager {
    instance: InstanceAddr,
    connect_timeout: Duration,
}

impl RespManager {
    pub fn new(instance: InstanceAddr, connect_timeout: Duration) -> Self {
        Self {
            instance,
            connect_timeout,
        }
    }
}

impl managed::Manager for RespManager {
    type Type = RespConnection;
    type Error = ConnectionError;

    async fn create(&self) -> Result<RespConnection, ConnectionError> {
        debug!("Dialing new connection to {}", self.instance);
        RespConnection::connect(&self.instance, self.connect_timeout).await
    }

    /// A pooled connection is only handed out again after a successful PING
    async fn recycle(
        &self,
        conn: &mut RespConnection,
        _: &managed::Metrics,
    ) -> managed::RecycleResult<ConnectionError> {
        match tokio::time::timeout(PING_TIMEOUT, conn.ping()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                debug!("Discarding pooled connection to {}: {}", self.instance, e);
                Err(managed::RecycleError::Backend(e))
            }
            Err(_) => {
                debug!("Discarding pooled connection to {}: PING timed out", self.instance);
                Err(managed::RecycleError::Backend(ConnectionError::Unhealthy {
                    address: self.instance.to_string(),
                    reason: format!("no PING reply within {:?}", PING_TIMEOUT),
                }))
            }
        }
    }
}
