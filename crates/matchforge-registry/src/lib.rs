//! Match dispatch for Matchforge.
//!
//! Each open match runs as an isolated Tokio task (actor model) that owns
//! its [`SessionController`](matchforge_session::SessionController). Every
//! connect, disconnect, and ready confirmation for that match goes through
//! the actor's channel, so they are applied one at a time and in arrival
//! order. The ready-check heartbeat is polled by the same task, which
//! keeps `ready-check` and `state-sync` emissions in causal order.
//!
//! # Key types
//!
//! - [`MatchRegistry`] — opens, routes to, and closes matches
//! - [`MatchHandle`] — send commands to a running match actor
//! - [`RegistryConfig`] — actor channel sizing

mod actor;
mod config;
mod error;
mod registry;

pub use actor::MatchHandle;
pub use config::RegistryConfig;
pub use error::RegistryError;
pub use registry::MatchRegistry;
