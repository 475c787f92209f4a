//! Wire and persistence types for Matchforge.
//!
//! This crate defines everything that leaves a match controller, either
//! towards the clients or towards durable storage:
//!
//! - **Identity** ([`PlayerId`], [`MatchId`]) — who plays, which match.
//! - **State** ([`SessionState`] and its parts) — the authoritative
//!   snapshot of one match. The same shape is persisted and broadcast.
//! - **Events** ([`OutboundEvent`]) — the signals a controller emits.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those values are
//!   turned into bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Registry (dispatch) → Session (controller) → Protocol (this crate)
//!                                 ↘ Store (persistence) ↗
//! ```

mod codec;
mod error;
mod event;
mod state;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use event::{EventKind, OutboundEvent};
pub use state::{
    Ball, Outcome, PlayerSnapshot, Presence, SessionState, Side, SideState,
    Status,
};
pub use types::{MatchId, PlayerId};
