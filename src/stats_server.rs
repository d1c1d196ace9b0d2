//! Optional diagnostic endpoint
//!
//! `GET /` (also `/debug/vars`) returns the current counters as JSON:
//! `{"uptime_secs": 12, "counters": {"6379.orders.lpush": 3}}`.

use anyhow::{Context, Result};
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::metrics::CounterStore;

/// Body of a stats response
#[derive(Debug, Serialize)]
pub struct StatsBody {
    pub uptime_secs: u64,
    pub counters: BTreeMap<String, u64>,
}

impl StatsBody {
    /// Capture the store's current counters keyed by metric path
    #[must_use]
    pub fn capture(store: &CounterStore) -> Self {
        let counters = store
            .snapshot()
            .counters
            .into_iter()
            .map(|(key, value)| (key.metric_path(), value))
            .collect();
        Self {
            uptime_secs: store.uptime().as_secs(),
            counters,
        }
    }
}

async fn stats_handler(State(store): State<CounterStore>) -> Json<StatsBody> {
    Json(StatsBody::capture(&store))
}

async fn health_handler() -> &'static str {
    "OK"
}

/// Routes served by the endpoint
pub fn router(store: CounterStore) -> Router {
    Router::new()
        .route("/", get(stats_handler))
        .route("/debug/vars", get(stats_handler))
        .route("/health", get(health_handler))
        .with_state(store)
}

/// HTTP listener serving [`router`]
#[derive(Debug)]
pub struct StatsServer {
    listener: TcpListener,
    store: CounterStore,
}

impl StatsServer {
    /// Bind the listener
    ///
    /// # Errors
    /// Fails when the address is invalid or already in use.
    pub async fn bind(address: &str, store: CounterStore) -> Result<Self> {
        let listener = TcpListener::bind(address)
            .await
            .with_context(|| format!("Failed to bind stats endpoint on {}", address))?;
        Ok(Self { listener, store })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve requests until the task is dropped
    pub async fn run(self) {
        if let Ok(addr) = self.listener.local_addr() {
            info!("Stats endpoint listening on http://{}", addr);
        }
        if let Err(e) = axum::serve(self.listener, router(self.store)).await {
            warn!("Stats endpoint stopped: {}", e);
        }
    }
}
