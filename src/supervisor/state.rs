//! Supervisor lifecycle states

use std::fmt;

/// Where an instance supervisor is in its lifecycle
///
/// `Connecting` happens once. After that the supervisor cycles through
/// `Subscribing`, `Active` and `Reconnecting` until it is stopped. `Failed`
/// is terminal and only reachable from `Connecting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupervisorState {
    Connecting,
    Subscribing,
    Active,
    Reconnecting,
    Failed,
}

impl SupervisorState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Failed)
    }
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::Subscribing => "subscribing",
            Self::Active => "active",
            Self::Reconnecting => "reconnecting",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}
