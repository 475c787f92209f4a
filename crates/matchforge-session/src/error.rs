//! Error types for the session layer.

use matchforge_protocol::{MatchId, PlayerId};
use matchforge_store::StoreError;

/// Errors a [`SessionController`](crate::SessionController) can surface.
///
/// Calls naming a player outside the roster are not errors: they are
/// ignored. The only way an operation fails is when its mutation could
/// not be committed.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The match store did not record the mutation. The controller kept
    /// its last committed state and emitted nothing.
    #[error("failed to persist match {match_id}: {source}")]
    Persistence {
        match_id: MatchId,
        #[source]
        source: StoreError,
    },

    /// The roster handed to the controller does not name two distinct
    /// players.
    #[error("invalid roster for match {match_id}: {player} is seated twice")]
    InvalidRoster { match_id: MatchId, player: PlayerId },
}
