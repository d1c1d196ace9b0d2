//! Constants used throughout the collector
//!
//! Centralizes intervals, limits and naming so tuning happens in one place.

use std::time::Duration;

/// Socket and read-buffer sizing
pub mod socket {
    /// Receive buffer requested for instance connections
    ///
    /// Notification frames are tiny; this only needs to absorb bursts while
    /// the consume loop is descheduled.
    pub const RECV_BUFFER: usize = 256 * 1024;

    /// Send buffer requested for instance connections
    pub const SEND_BUFFER: usize = 64 * 1024;

    /// Size of a single socket read into the reply buffer
    pub const READ_CHUNK: usize = 8 * 1024;

    /// Idle time before TCP keepalive packets start
    pub const KEEPALIVE_TIME_SECS: u64 = 60;

    /// Interval between TCP keepalive packets
    pub const KEEPALIVE_INTERVAL_SECS: u64 = 10;
}

/// Connection pool behaviour
pub mod pool {
    use super::Duration;

    /// Idle connections unused for longer than this are closed
    pub const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

    /// Upper bound for a single dial attempt
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Upper bound for the liveness round-trip run before reusing a connection
    pub const PING_TIMEOUT: Duration = Duration::from_secs(2);

    /// Upper bound for one-shot commands (role query, configuration)
    pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(5);
}

/// Collector timing defaults
pub mod collector {
    use super::Duration;

    /// How often the role monitor asks an instance whether it is a replica
    pub const ROLE_CHECK_INTERVAL: Duration = Duration::from_secs(1);

    /// Pause between reconnect attempts after a lost connection
    pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

    /// How long the consume loop waits before re-checking a closed gate
    pub const IDLE_POLL_INTERVAL: Duration = Duration::from_secs(1);
}

/// Metrics emission
pub mod metrics {
    use super::Duration;

    /// Root segment of every emitted metric path
    pub const DEFAULT_PREFIX: &str = "scouter";

    /// Interval between flushes to the metrics backend
    pub const FLUSH_INTERVAL: Duration = Duration::from_secs(60);

    /// Default Graphite host
    pub const GRAPHITE_HOST: &str = "localhost";

    /// Hostname segment used when the host name cannot be determined
    pub const UNKNOWN_HOST: &str = "unknown";
}

/// Key-space notification flags
pub mod keyspace {
    /// Flag enabling list command notifications
    pub const LIST_EVENTS: char = 'l';

    /// Flag enabling `__keyspace@<db>__:<key>` channels
    pub const KEYSPACE_EVENTS: char = 'K';

    /// Alias for "all event classes" (excludes the channel-type flags)
    pub const ALL_EVENTS: char = 'A';

    /// Channel prefix of key-space notifications
    pub const CHANNEL_PREFIX: &str = "__keyspace@";

    /// Separator between the database number and the key name
    pub const KEY_SEPARATOR: &str = "__:";
}

/// Process discovery
pub mod discovery {
    /// Executable name of store server processes
    pub const SERVER_PROCESS: &str = "redis-server";
}

/// Diagnostic endpoint
pub mod stats {
    /// Default listen address
    pub const LISTEN: &str = "127.0.0.1:8888";
}
