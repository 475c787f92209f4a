//! # Matchforge
//!
//! Session control for two-player matches.
//!
//! A match goes through a fixed handshake before play begins:
//!
//! ```text
//! waiting ──(both connected)──→ ready ──(both confirmed)──→ started
//! ```
//!
//! One [`SessionController`](prelude::SessionController) per match owns the
//! state, persists every change through a [`MatchStore`](prelude::MatchStore),
//! and broadcasts it through an [`EventSink`](prelude::EventSink). The
//! [`MatchRegistry`](prelude::MatchRegistry) runs each controller as an
//! actor so calls for one match never race.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use matchforge::prelude::*;
//!
//! # async fn run() -> Result<(), MatchforgeError> {
//! let store = Arc::new(MemoryStore::new());
//! let mut registry = MatchRegistry::new(store, SessionConfig::default());
//!
//! let match_id = MatchId::new("m-1");
//! let players = [PlayerId(1), PlayerId(2)];
//! let handle = registry.open(match_id.clone(), players, Vec::new()).await?;
//! let mut events = handle.subscribe(PlayerId(1));
//!
//! registry.route_connect(&match_id, PlayerId(1)).await?;
//! registry.route_connect(&match_id, PlayerId(2)).await?;
//! while let Some(event) = events.recv().await {
//!     println!("{}", event.kind().as_str());
//! }
//! # Ok(())
//! # }
//! ```

mod error;
pub mod logging;

pub use error::MatchforgeError;

pub use matchforge_protocol as protocol;
pub use matchforge_registry as registry;
pub use matchforge_session as session;
pub use matchforge_store as store;
pub use matchforge_tick as tick;

/// The types most applications need, in one import.
pub mod prelude {
    pub use crate::MatchforgeError;
    pub use matchforge_protocol::{
        Codec, EventKind, JsonCodec, MatchId, OutboundEvent, Outcome, PlayerId, PlayerSnapshot,
        Presence, SessionState, Side, Status,
    };
    pub use matchforge_registry::{MatchHandle, MatchRegistry, RegistryConfig};
    pub use matchforge_session::{
        ChannelSink, DisconnectPolicy, EventReceiver, EventSink, MatchSetup, Seating,
        SessionConfig, SessionController,
    };
    pub use matchforge_store::{MatchStore, MemoryStore};
    pub use matchforge_tick::{HeartbeatConfig, MissPolicy};
}
