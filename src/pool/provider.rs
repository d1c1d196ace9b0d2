//! Per-instance connection pool
//!
//! [`InstancePool`] is the Connection Manager for one monitored instance:
//! - `acquire()` hands out a connection that was just dialed or that passed a
//!   PING round-trip
//! - dropping the guard (or calling `release()`) returns it to the pool
//! - `discard()` removes a connection known to be broken
//! - `detach()` takes a connection out of the pool for good, which is what the
//!   subscriber needs since a subscribed connection can no longer run commands
//! - a background reaper closes connections idle for longer than the idle timeout

use deadpool::managed::{self, Object, PoolError};
use std::time::Duration;
use tracing::{debug, info};

use super::connection::RespConnection;
use super::manager::RespManager;
use crate::connection_error::ConnectionError;
use crate::constants::pool::{CONNECT_TIMEOUT, IDLE_TIMEOUT};
use crate::types::{InstanceAddr, MaxConnections};

type Pool = managed::Pool<RespManager>;

/// A pooled connection, returned to its pool when dropped
pub type PooledConnection = Object<RespManager>;

/// Snapshot of pool occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub available: usize,
    pub size: usize,
    pub max_size: usize,
}

/// Connection pool for one instance
#[derive(Debug, Clone)]
pub struct InstancePool {
    pool: Pool,
    instance: InstanceAddr,
    idle_timeout: Duration,
}

/// Builder for [`InstancePool`]
///
/// ```no_run
/// use queue_scouter::pool::InstancePool;
/// use queue_scouter::types::InstanceAddr;
///
/// let instance: InstanceAddr = "6379".parse().unwrap();
/// let pool = InstancePool::builder(instance).build().unwrap();
/// ```
#[derive(Debug)]
pub struct Builder {
    instance: InstanceAddr,
    max_size: MaxConnections,
    idle_timeout: Duration,
    connect_timeout: Duration,
}

impl Builder {
    /// Limit how many connections may exist at once
    #[must_use]
    pub fn max_size(mut self, max_size: MaxConnections) -> Self {
        self.max_size = max_size;
        self
    }

    /// Close connections idle for longer than this
    #[must_use]
    pub fn idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Bound each dial attempt
    #[must_use]
    pub fn connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Build the pool
    ///
    /// # Errors
    /// Returns an error if deadpool rejects the configuration
    pub fn build(self) -> Result<InstancePool, ConnectionError> {
        let manager = RespManager::new(self.instance.clone(), self.connect_timeout);
        let pool = Pool::builder(manager)
            .max_size(self.max_size.get())
            .build()
            .map_err(|e| ConnectionError::Pool {
                address: self.instance.to_string(),
                reason: e.to_string(),
            })?;

        debug!(
            "Created connection pool for {} (max {} connections)",
            self.instance, self.max_size
        );

        Ok(InstancePool {
            pool,
            instance: self.instance,
            idle_timeout: self.idle_timeout,
        })
    }
}

impl InstancePool {
    /// Start building a pool for `instance`
    #[must_use]
    pub fn builder(instance: InstanceAddr) -> Builder {
        Builder {
            instance,
            max_size: MaxConnections::DEFAULT,
            idle_timeout: IDLE_TIMEOUT,
            connect_timeout: CONNECT_TIMEOUT,
        }
    }

    /// Instance served by this pool
    #[must_use]
    pub fn instance(&self) -> &InstanceAddr {
        &self.instance
    }

    /// Get a live connection
    ///
    /// # Errors
    /// Dial failures surface as the underlying [`ConnectionError`]; they are
    /// never retried here.
    pub async fn acquire(&self) -> Result<PooledConnection, ConnectionError> {
        self.pool.get().await.map_err(|e| match e {
            PoolError::Backend(err) => err,
            other => ConnectionError::Pool {
                address: self.instance.to_string(),
                reason: other.to_string(),
            },
        })
    }

    /// Return a healthy connection to the pool
    pub fn release(&self, conn: PooledConnection) {
        drop(conn);
    }

    /// Drop a broken connection without returning it to the pool
    pub fn discard(&self, conn: PooledConnection) {
        drop(Object::take(conn));
    }

    /// Take ownership of a connection, freeing its pool slot
    #[must_use]
    pub fn detach(&self, conn: PooledConnection) -> RespConnection {
        Object::take(conn)
    }

    /// Close idle connections unused for longer than the idle timeout
    ///
    /// Returns the number of connections closed.
    pub fn reap_idle(&self) -> usize {
        let idle_timeout = self.idle_timeout;
        let result = self
            .pool
            .retain(|_, metrics| metrics.last_used() < idle_timeout);
        let removed = result.removed.len();
        if removed > 0 {
            let status = self.status();
            debug!(
                "Closed {} idle connection(s) to {} ({} open, {} idle, max {})",
                removed, self.instance, status.size, status.available, status.max_size
            );
        }
        removed
    }

    /// Periodically reap idle connections until the task is dropped
    pub async fn run_idle_reaper(self) {
        let period = (self.idle_timeout / 2).max(Duration::from_millis(10));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            self.reap_idle();
        }
    }

    /// Current pool occupancy
    #[must_use]
    pub fn status(&self) -> PoolStatus {
        let status = self.pool.status();
        PoolStatus {
            available: status.available,
            size: status.size,
            max_size: status.max_size,
        }
    }

    /// Close the pool; outstanding connections are dropped when released
    pub fn close(&self) {
        info!("Closing connection pool for {}", self.instance);
        self.pool.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Minimal server answering every read with +PONG and counting accepted connections
    async fn spawn_pong_server() -> (InstanceAddr, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = accepted.clone();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(async move {
                    let mut buf = [0u8; 512];
                    while let Ok(n) = stream.read(&mut buf).await {
                        if n == 0 || stream.write_all(b"+PONG\r\n").await.is_err() {
                            break;
                        }
                    }
                });
            }
        });
        (format!("127.0.0.1:{}", port).parse().unwrap(), accepted)
    }

    #[tokio::test]
    async fn test_release_reuses_connection() {
        let (addr, accepted) = spawn_pong_server().await;
        let pool = InstancePool::builder(addr).build().unwrap();

        let conn = pool.acquire().await.unwrap();
        pool.release(conn);
        let conn = pool.acquire().await.unwrap();
        pool.release(conn);

        assert_eq!(accepted.load(Ordering::SeqCst), 1);
        assert_eq!(pool.status().size, 1);
    }

    #[tokio::test]
    async fn test_discard_forces_new_dial() {
        let (addr, accepted) = spawn_pong_server().await;
        let pool = InstancePool::builder(addr).build().unwrap();

        let conn = pool.acquire().await.unwrap();
        pool.discard(conn);
        let _conn = pool.acquire().await.unwrap();

        assert_eq!(accepted.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_detach_frees_slot() {
        let (addr, _) = spawn_pong_server().await;
        let pool = InstancePool::builder(addr)
            .max_size(MaxConnections::new(1).unwrap())
            .build()
            .unwrap();

        let conn = pool.acquire().await.unwrap();
        let mut owned = pool.detach(conn);
        owned.ping().await.unwrap();

        // The single slot is free again
        let _second = tokio::time::timeout(Duration::from_secs(1), pool.acquire())
            .await
            .expect("slot should be free after detach")
            .unwrap();
    }

    #[tokio::test]
    async fn test_reap_idle_closes_stale_connections() {
        let (addr, _) = spawn_pong_server().await;
        let pool = InstancePool::builder(addr)
            .idle_timeout(Duration::from_millis(20))
            .build()
            .unwrap();

        let conn = pool.acquire().await.unwrap();
        pool.release(conn);
        assert_eq!(pool.status().size, 1);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(pool.reap_idle(), 1);
        assert_eq!(pool.status().size, 0);
    }

    #[tokio::test]
    async fn test_acquire_unreachable_reports_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let addr: InstanceAddr = format!("127.0.0.1:{}", port).parse().unwrap();
        let pool = InstancePool::builder(addr).build().unwrap();

        let err = pool.acquire().await.unwrap_err();
        assert!(matches!(err, ConnectionError::TcpConnect { .. }));
    }
}
