//! Durable storage for match state.
//!
//! The controller needs exactly two things from persistence: load the last
//! committed [`SessionState`](matchforge_protocol::SessionState) for a
//! match, and save a new one. [`MatchStore`] is that contract; plug in a
//! database-backed implementation in production and [`MemoryStore`] in
//! tests and demos.

#![allow(async_fn_in_trait)]

mod error;
mod memory;
mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use store::MatchStore;
