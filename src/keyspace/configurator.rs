//! Enabling list notifications on an instance without clobbering its settings

use tracing::{debug, info, warn};

use crate::connection_error::ConnectionError;
use crate::constants::keyspace::{ALL_EVENTS, KEYSPACE_EVENTS, LIST_EVENTS};
use crate::constants::pool::COMMAND_TIMEOUT;
use crate::pool::InstancePool;
use crate::protocol::commands::NOTIFY_KEYSPACE_EVENTS;

/// Flags written when nothing is configured, appended otherwise
pub const REQUIRED_FLAGS: &str = "lK";

/// What has to change for list notifications to be published
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationPlan {
    /// Key-space channels and list events are already on
    AlreadyEnabled,
    /// Write this value
    Set(String),
}

/// Whether a `notify-keyspace-events` value publishes list events on key-space channels
#[must_use]
pub fn list_events_enabled(current: &str) -> bool {
    current.contains(KEYSPACE_EVENTS)
        && (current.contains(LIST_EVENTS) || current.contains(ALL_EVENTS))
}

/// Decide the new `notify-keyspace-events` value from the current one
///
/// ```
/// use queue_scouter::keyspace::{NotificationPlan, plan};
///
/// assert_eq!(plan(""), NotificationPlan::Set("lK".to_string()));
/// assert_eq!(plan("Elg"), NotificationPlan::Set("ElglK".to_string()));
/// assert_eq!(plan("AKE"), NotificationPlan::AlreadyEnabled);
/// ```
#[must_use]
pub fn plan(current: &str) -> NotificationPlan {
    let current = current.trim();
    if list_events_enabled(current) {
        NotificationPlan::AlreadyEnabled
    } else if current.is_empty() {
        NotificationPlan::Set(REQUIRED_FLAGS.to_string())
    } else {
        NotificationPlan::Set(format!("{}{}", current, REQUIRED_FLAGS))
    }
}

/// Make sure `instance` publishes list events on key-space channels
///
/// Reads the current setting, then writes it back extended with the
/// required flags when needed. Uses a pooled connection.
///
/// # Errors
/// Any failure to acquire a connection or run the commands. Callers treat
/// this as non-fatal.
pub async fn ensure_list_events_enabled(
    pool: &InstancePool,
) -> Result<NotificationPlan, ConnectionError> {
    let instance = pool.instance().clone();
    let mut conn = pool.acquire().await?;

    let result = tokio::time::timeout(COMMAND_TIMEOUT, async {
        let current = conn
            .config_get(NOTIFY_KEYSPACE_EVENTS)
            .await?
            .unwrap_or_default();
        debug!("Instance {} has {}='{}'", instance, NOTIFY_KEYSPACE_EVENTS, current);

        let plan = plan(&current);
        if let NotificationPlan::Set(value) = &plan {
            conn.config_set(NOTIFY_KEYSPACE_EVENTS, value).await?;
        }
        Ok::<_, ConnectionError>(plan)
    })
    .await
    .unwrap_or_else(|_| {
        Err(ConnectionError::Unhealthy {
            address: instance.to_string(),
            reason: format!("configuration not applied within {:?}", COMMAND_TIMEOUT),
        })
    });

    match &result {
        Ok(NotificationPlan::AlreadyEnabled) => {
            info!("List notifications already enabled on {}", instance);
        }
        Ok(NotificationPlan::Set(value)) => {
            info!("Set {}='{}' on {}", NOTIFY_KEYSPACE_EVENTS, value, instance);
        }
        Err(e) => {
            warn!("Could not configure notifications on {}: {}", instance, e);
        }
    }

    if matches!(&result, Err(e) if e.is_connection_lost()) {
        pool.discard(conn);
    } else {
        pool.release(conn);
    }
    result
}
