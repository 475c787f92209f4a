//! Session configuration.

use std::fmt;

use matchforge_tick::HeartbeatConfig;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DisconnectPolicy
// ---------------------------------------------------------------------------

/// What a disconnect does beyond marking the player offline.
///
/// The status never moves backwards under any policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisconnectPolicy {
    /// Mark the player offline and nothing else. The ready-check keeps
    /// beating if it was running.
    #[default]
    Ignore,

    /// Mark the match paused and silence the ready-check until both
    /// players are back. Reconnecting clears the pause.
    Pause,

    /// A disconnect from a started match forfeits it to the other side.
    /// Before the start this behaves like `Ignore`.
    Forfeit,
}

impl fmt::Display for DisconnectPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ignore => f.write_str("ignore"),
            Self::Pause => f.write_str("pause"),
            Self::Forfeit => f.write_str("forfeit"),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration shared by every controller a registry creates.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Cadence of the `ready-check` signal while in the `ready` status.
    pub ready_check: HeartbeatConfig,

    /// Handling of disconnects after both players have connected.
    pub disconnect_policy: DisconnectPolicy,
}

impl SessionConfig {
    pub fn with_disconnect_policy(mut self, policy: DisconnectPolicy) -> Self {
        self.disconnect_policy = policy;
        self
    }

    pub fn with_ready_check(mut self, heartbeat: HeartbeatConfig) -> Self {
        self.ready_check = heartbeat;
        self
    }
}
