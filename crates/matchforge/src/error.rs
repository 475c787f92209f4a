//! Unified error type for Matchforge.

use matchforge_protocol::ProtocolError;
use matchforge_registry::RegistryError;
use matchforge_session::SessionError;
use matchforge_store::StoreError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impl, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum MatchforgeError {
    /// Encoding or decoding failed, or a state failed validation.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The match store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A controller operation could not be committed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A match could not be opened or reached.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
