//! Per-match session control for Matchforge.
//!
//! This crate owns the part of a match that is actually hard: two remote
//! players connecting, dropping, and coming back, reconciled into one
//! authoritative [`SessionState`](matchforge_protocol::SessionState).
//!
//! 1. **Roster** — [`MatchSetup`] describes who plays and how they are
//!    seated ([`Seating`]).
//! 2. **Connections** — [`ConnectionSet`] tracks which of the two are
//!    currently connected.
//! 3. **Control** — [`SessionController`] runs the
//!    connect → ready → start handshake, persists every committed change
//!    through a [`MatchStore`](matchforge_store::MatchStore), and then
//!    broadcasts it through an [`EventSink`].
//!
//! # How it fits in the stack
//!
//! ```text
//! Registry (above)   ← one actor per match id, serializes calls
//!     ↕
//! Session (this crate)
//!     ↕
//! Protocol / Store / Tick (below)
//! ```

mod config;
mod connection;
mod controller;
mod error;
mod setup;
mod sink;

pub use config::{DisconnectPolicy, SessionConfig};
pub use connection::ConnectionSet;
pub use controller::SessionController;
pub use error::SessionError;
pub use setup::{MatchSetup, Seating};
pub use sink::{ChannelSink, EventReceiver, EventSink};
