//! Error types for the registry layer.

use matchforge_protocol::MatchId;
use matchforge_session::SessionError;
use matchforge_store::StoreError;

/// Errors that can occur while opening or routing to a match.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No match with this id is open.
    #[error("match {0} not found")]
    NotFound(MatchId),

    /// The match actor's channel is closed (it shut down).
    #[error("match {0} is unavailable")]
    Unavailable(MatchId),

    /// The session controller rejected or failed the operation.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Prior state could not be loaded when opening a match.
    #[error("failed to load match state: {0}")]
    Store(#[from] StoreError),
}
