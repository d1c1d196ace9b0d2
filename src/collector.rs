//! Process-level wiring
//!
//! [`Collector`] starts one supervisor per instance, the optional stats
//! endpoint and the flush loop, and tears them down on shutdown.

use anyhow::{Context, Result};
use std::future::Future;
use tokio::task::{JoinHandle, JoinSet};
use tracing::info;

use crate::config::Config;
use crate::discovery::resolve_instances;
use crate::flush::{Flusher, host_label};
use crate::metrics::CounterStore;
use crate::pool::InstancePool;
use crate::sink;
use crate::stats_server::StatsServer;
use crate::supervisor::Supervisor;
use crate::types::InstanceAddr;

/// A running collector
#[derive(Debug)]
pub struct Collector {
    store: CounterStore,
    flusher: Flusher,
    flush_interval: std::time::Duration,
    instances: Vec<InstanceAddr>,
    supervisors: JoinSet<()>,
    stats: Option<JoinHandle<()>>,
}

impl Collector {
    /// Resolve instances, connect the sink and start supervising
    ///
    /// # Errors
    /// Fails when there is nothing to monitor, the sink cannot be reached or
    /// the stats endpoint cannot be bound.
    pub async fn start(config: Config) -> Result<Self> {
        let instances = resolve_instances(&config.instances)?;
        let sink = sink::from_settings(&config.graphite).await?;
        let store = CounterStore::new();
        let host = host_label();

        info!(
            "Monitoring {} instance(s) as host '{}': {}",
            instances.len(),
            host,
            instances
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );

        let mut supervisors = JoinSet::new();
        for instance in &instances {
            let pool = InstancePool::builder(instance.clone())
                .max_size(config.pool.max_size)
                .idle_timeout(config.pool.idle_timeout)
                .connect_timeout(config.pool.connect_timeout)
                .build()
                .with_context(|| format!("Failed to create connection pool for {}", instance))?;
            let supervisor = Supervisor::new(pool, store.clone(), config.collector);
            supervisors.spawn(async move {
                // An unreachable instance is logged by the supervisor itself
                let _ = supervisor.run().await;
            });
        }

        let stats = if config.stats.enabled {
            let server = StatsServer::bind(&config.stats.listen, store.clone()).await?;
            Some(tokio::spawn(server.run()))
        } else {
            None
        };

        let flusher = Flusher::new(store.clone(), sink, config.metrics.prefix.clone(), host);

        Ok(Self {
            store,
            flusher,
            flush_interval: config.metrics.flush_interval,
            instances,
            supervisors,
            stats,
        })
    }

    #[must_use]
    pub fn store(&self) -> &CounterStore {
        &self.store
    }

    #[must_use]
    pub fn instances(&self) -> &[InstanceAddr] {
        &self.instances
    }

    /// Flush periodically until `shutdown` resolves, then stop everything
    pub async fn run_until(mut self, shutdown: impl Future<Output = ()>) {
        tokio::select! {
            () = self.flusher.clone().run(self.flush_interval) => {}
            () = shutdown => {}
        }

        self.supervisors.abort_all();
        while self.supervisors.join_next().await.is_some() {}
        if let Some(stats) = self.stats.take() {
            stats.abort();
        }
        info!("Collector stopped");
    }
}
