//! Outbound event vocabulary.
//!
//! A controller talks to its clients with exactly three signals. On the
//! wire each one is an adjacently tagged envelope:
//!
//! ```json
//! { "event": "match-begin", "payload": "clq2x9m0a0000" }
//! { "event": "state-sync",  "payload": { "status": "ready", ... } }
//! { "event": "ready-check" }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{MatchId, SessionState};

/// A signal emitted by a match controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum OutboundEvent {
    /// Route both players to the match view.
    MatchBegin(MatchId),

    /// The full current state, after a committed mutation.
    StateSync(SessionState),

    /// Ask both clients to confirm they are ready. Repeated on a fixed
    /// period while the match is in the `ready` status.
    ReadyCheck,
}

impl OutboundEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::MatchBegin(_) => EventKind::MatchBegin,
            Self::StateSync(_) => EventKind::StateSync,
            Self::ReadyCheck => EventKind::ReadyCheck,
        }
    }
}

/// The event type name, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    MatchBegin,
    StateSync,
    ReadyCheck,
}

impl EventKind {
    /// The string clients switch on.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MatchBegin => "match-begin",
            Self::StateSync => "state-sync",
            Self::ReadyCheck => "ready-check",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
