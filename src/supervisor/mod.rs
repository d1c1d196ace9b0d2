//! Per-instance collection lifecycle
//!
//! A [`Supervisor`] owns one instance end to end. It dials the instance,
//! subscribes to every key-space channel, counts list operations while the
//! instance is a master and reconnects forever once the first dial has
//! succeeded. The role monitor and idle reaper run beside it as helper tasks
//! and are aborted when the supervisor stops.

mod state;

pub use state::SupervisorState;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time;
use tracing::{debug, error, info, trace, warn};

use crate::config::CollectorSettings;
use crate::connection_error::ConnectionError;
use crate::constants::pool::COMMAND_TIMEOUT;
use crate::keyspace::{classify, ensure_list_events_enabled};
use crate::metrics::{CounterKey, CounterStore};
use crate::pool::{InstancePool, RespConnection};
use crate::protocol::PubSubMessage;
use crate::protocol::commands::{KEYSPACE_PATTERN, psubscribe};
use crate::role::{CollectionGate, RoleMonitor};
use crate::types::InstanceAddr;

/// Drives collection for one instance
#[derive(Debug)]
pub struct Supervisor {
    pool: InstancePool,
    store: CounterStore,
    gate: CollectionGate,
    settings: CollectorSettings,
    state: watch::Sender<SupervisorState>,
}

impl Supervisor {
    #[must_use]
    pub fn new(pool: InstancePool, store: CounterStore, settings: CollectorSettings) -> Self {
        let (state, _) = watch::channel(SupervisorState::Connecting);
        Self {
            pool,
            store,
            gate: CollectionGate::new(),
            settings,
            state,
        }
    }

    #[must_use]
    pub fn instance(&self) -> &InstanceAddr {
        self.pool.instance()
    }

    /// The collection switch flipped by this instance's role monitor
    #[must_use]
    pub fn gate(&self) -> CollectionGate {
        self.gate.clone()
    }

    /// Watch lifecycle transitions
    #[must_use]
    pub fn state(&self) -> watch::Receiver<SupervisorState> {
        self.state.subscribe()
    }

    /// Run until aborted
    ///
    /// # Errors
    /// Returns only when the very first connection attempt fails; the
    /// instance is then considered absent and is not retried.
    pub async fn run(self) -> Result<(), ConnectionError> {
        let instance = self.instance().clone();
        self.transition(SupervisorState::Connecting);

        let mut conn = match self.open_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                error!("Instance {} is unreachable, not monitoring it: {}", instance, e);
                self.pool.close();
                self.transition(SupervisorState::Failed);
                return Err(e);
            }
        };
        info!("Connected to {}", instance);

        let mut helpers = JoinSet::new();
        helpers.spawn(
            RoleMonitor::new(
                self.pool.clone(),
                self.gate.clone(),
                self.settings.role_check_interval,
                self.settings.reconnect_delay,
            )
            .run(),
        );
        helpers.spawn(self.pool.clone().run_idle_reaper());

        loop {
            self.transition(SupervisorState::Subscribing);
            match self.subscribe(&mut conn).await {
                Ok(()) => {
                    info!("Subscribed to key-space notifications on {}", instance);
                    if self.settings.configure_notifications {
                        let pool = self.pool.clone();
                        helpers.spawn(async move {
                            // Failures are logged by the configurator and retried on the next cycle
                            let _ = ensure_list_events_enabled(&pool).await;
                        });
                    }

                    self.transition(SupervisorState::Active);
                    let e = self.consume(&mut conn).await;
                    warn!("Lost subscription to {}: {}", instance, e);
                }
                Err(e) => warn!("Subscribing on {} failed: {}", instance, e),
            }

            // Finished configurator runs
            while helpers.try_join_next().is_some() {}

            self.transition(SupervisorState::Reconnecting);
            drop(conn);
            conn = self.reconnect().await;
            info!("Reconnected to {}", instance);
        }
    }

    /// Take a fresh connection out of the pool for the subscription
    async fn open_connection(&self) -> Result<RespConnection, ConnectionError> {
        let pooled = self.pool.acquire().await?;
        Ok(self.pool.detach(pooled))
    }

    async fn reconnect(&self) -> RespConnection {
        let mut attempts: u32 = 0;
        loop {
            time::sleep(self.settings.reconnect_delay).await;
            attempts += 1;
            match self.open_connection().await {
                Ok(conn) => return conn,
                Err(e) if attempts == 1 => {
                    warn!("Reconnecting to {} failed, will keep trying: {}", self.instance(), e);
                }
                Err(e) => {
                    debug!("Reconnect attempt {} to {} failed: {}", attempts, self.instance(), e);
                }
            }
        }
    }

    /// Issue the wildcard subscription and wait for its acknowledgement
    async fn subscribe(&self, conn: &mut RespConnection) -> Result<(), ConnectionError> {
        conn.send(&psubscribe(KEYSPACE_PATTERN)).await?;

        let acked = time::timeout(COMMAND_TIMEOUT, async {
            loop {
                match conn.next_pubsub().await? {
                    PubSubMessage::Subscribed { target, count } => {
                        debug!("Subscription to {} acknowledged ({} active)", target, count);
                        return Ok::<_, ConnectionError>(());
                    }
                    PubSubMessage::Message { .. } => {
                        trace!("Ignoring delivery before acknowledgement");
                    }
                }
            }
        })
        .await;

        match acked {
            Ok(result) => result,
            Err(_) => Err(ConnectionError::Unhealthy {
                address: self.instance().to_string(),
                reason: format!("subscription not acknowledged within {:?}", COMMAND_TIMEOUT),
            }),
        }
    }

    /// Count notifications until the connection fails
    ///
    /// While the gate is closed, deliveries are still read so they never
    /// pile up and get counted after a promotion.
    async fn consume(&self, conn: &mut RespConnection) -> ConnectionError {
        loop {
            let next = if self.gate.is_open() {
                conn.next_pubsub().await
            } else {
                match time::timeout(self.settings.idle_poll_interval, conn.next_pubsub()).await {
                    Ok(next) => next,
                    Err(_) => continue,
                }
            };

            match next {
                Ok(message) => self.record(message),
                Err(e) => return e,
            }
        }
    }

    fn record(&self, message: PubSubMessage) {
        let PubSubMessage::Message {
            channel, payload, ..
        } = message
        else {
            return;
        };

        // The role may have changed while this read was pending
        if !self.gate.is_open() {
            trace!("Discarding {} {} from non-master {}", channel, payload, self.instance());
            return;
        }

        if let Some(event) = classify(&channel, &payload) {
            trace!("{} {} on {}", event.operation, event.queue, self.instance());
            self.store.increment(CounterKey::new(
                self.instance().clone(),
                event.queue,
                event.operation,
            ));
        }
    }

    fn transition(&self, next: SupervisorState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            debug!("Supervisor for {}: {} -> {}", self.instance(), previous, next);
        }
    }
}
