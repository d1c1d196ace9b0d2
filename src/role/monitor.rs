//! Replication role polling

use std::fmt;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::gate::CollectionGate;
use crate::connection_error::ConnectionError;
use crate::constants::pool::COMMAND_TIMEOUT;
use crate::pool::{InstancePool, PooledConnection, RespConnection};
use crate::protocol::commands::REPLICA_OF;

/// Replication role reported by an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicationRole {
    Master,
    Slave,
}

impl ReplicationRole {
    /// Interpret the `slaveof` setting: empty means the instance follows nobody
    #[must_use]
    pub fn from_replica_of(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(upstream) if !upstream.is_empty() => Self::Slave,
            _ => Self::Master,
        }
    }

    /// Whether events from an instance in this role are counted
    #[must_use]
    pub const fn collects(self) -> bool {
        matches!(self, Self::Master)
    }
}

impl fmt::Display for ReplicationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Master => f.write_str("master"),
            Self::Slave => f.write_str("slave"),
        }
    }
}

/// Remembers the last observed role and reports only changes
#[derive(Debug, Default)]
pub struct RoleTracker {
    previous: Option<ReplicationRole>,
}

impl RoleTracker {
    /// Record an observation, returning the role if it differs from the last one
    ///
    /// The first observation always counts as a change.
    pub fn observe(&mut self, role: ReplicationRole) -> Option<ReplicationRole> {
        if self.previous == Some(role) {
            None
        } else {
            self.previous = Some(role);
            Some(role)
        }
    }
}

/// Ask an instance for its replication role
///
/// Returns the role and the upstream it follows, if any.
pub async fn query_role(
    conn: &mut RespConnection,
) -> Result<(ReplicationRole, Option<String>), ConnectionError> {
    let value = conn.config_get(REPLICA_OF).await?;
    let role = ReplicationRole::from_replica_of(value.as_deref());
    Ok((role, value.filter(|v| !v.trim().is_empty())))
}

/// Polls one instance's role and drives its [`CollectionGate`]
///
/// Runs until its task is aborted. A failed poll leaves the gate untouched,
/// drops the connection and retries after the reconnect delay.
#[derive(Debug)]
pub struct RoleMonitor {
    pool: InstancePool,
    gate: CollectionGate,
    check_interval: Duration,
    reconnect_delay: Duration,
}

impl RoleMonitor {
    #[must_use]
    pub fn new(
        pool: InstancePool,
        gate: CollectionGate,
        check_interval: Duration,
        reconnect_delay: Duration,
    ) -> Self {
        Self {
            pool,
            gate,
            check_interval,
            reconnect_delay,
        }
    }

    pub async fn run(self) {
        let instance = self.pool.instance().clone();
        let mut tracker = RoleTracker::default();
        let mut conn: Option<PooledConnection> = None;
        let mut failures: u32 = 0;

        let mut ticker = time::interval(self.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let mut active = match conn.take() {
                Some(c) => c,
                None => match self.pool.acquire().await {
                    Ok(c) => c,
                    Err(e) => {
                        self.record_failure(&mut failures, &e);
                        time::sleep(self.reconnect_delay).await;
                        continue;
                    }
                },
            };

            let polled = time::timeout(COMMAND_TIMEOUT, query_role(&mut active))
                .await
                .unwrap_or_else(|_| {
                    Err(ConnectionError::Unhealthy {
                        address: instance.to_string(),
                        reason: format!("no role reply within {:?}", COMMAND_TIMEOUT),
                    })
                });

            match polled {
                Ok((role, upstream)) => {
                    if failures > 0 {
                        info!("Role checks on {} recovered after {} failure(s)", instance, failures);
                        failures = 0;
                    }
                    conn = Some(active);
                    if let Some(changed) = tracker.observe(role) {
                        self.apply(changed, upstream.as_deref());
                    }
                }
                Err(e) if !e.is_connection_lost() => {
                    // The server answered, the connection is still usable
                    self.record_failure(&mut failures, &e);
                    conn = Some(active);
                }
                Err(e) => {
                    self.record_failure(&mut failures, &e);
                    self.pool.discard(active);
                    time::sleep(self.reconnect_delay).await;
                }
            }
        }
    }

    fn apply(&self, role: ReplicationRole, upstream: Option<&str>) {
        let instance = self.pool.instance();
        self.gate.set(role.collects());
        match role {
            ReplicationRole::Master => {
                info!("Instance {} is a master, collecting queue metrics", instance);
            }
            ReplicationRole::Slave => {
                info!(
                    "Instance {} is a replica of {}, pausing collection",
                    instance,
                    upstream.unwrap_or("?")
                );
            }
        }
    }

    fn record_failure(&self, failures: &mut u32, error: &ConnectionError) {
        *failures += 1;
        if *failures == 1 {
            warn!(
                "Role check on {} failed, keeping previous state: {}",
                self.pool.instance(),
                error
            );
        } else {
            debug!(
                "Role check on {} failed ({} in a row): {}",
                self.pool.instance(),
                failures,
                error
            );
        }
    }
}
