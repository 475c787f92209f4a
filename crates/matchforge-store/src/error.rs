//! Error types for the storage layer.

use matchforge_protocol::{MatchId, ProtocolError};

/// Errors a [`MatchStore`](crate::MatchStore) can report.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The state could not be serialized for storage.
    #[error("failed to encode state for match {match_id}: {source}")]
    Encode {
        match_id: MatchId,
        #[source]
        source: ProtocolError,
    },

    /// A stored record exists but is not a usable match state.
    ///
    /// Callers treat this like "no prior state" and start the match
    /// fresh.
    #[error("stored state for match {match_id} is corrupt: {source}")]
    Corrupt {
        match_id: MatchId,
        #[source]
        source: ProtocolError,
    },

    /// The backend could not be reached or refused the write.
    #[error("match store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Returns `true` for errors that mean "the record is unusable" rather
    /// than "the store is broken".
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }
}
