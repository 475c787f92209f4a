//! The `MatchStore` trait.

use std::future::Future;

use matchforge_protocol::{MatchId, SessionState};

use crate::StoreError;

/// Key-value persistence of match state, keyed by match id.
///
/// # Trait bounds
///
/// A store is shared by every running match, so it must be
/// `Send + Sync + 'static`. The returned futures are `Send` so match
/// actors that await them can run on any Tokio worker.
///
/// # Contract
///
/// - `save` followed by `load` for the same id returns an equal state.
/// - `load` returns `Ok(None)` when nothing has ever been saved for the
///   id, and [`StoreError::Corrupt`] when something was saved but cannot
///   be decoded.
///
/// # Example
///
/// ```rust
/// use std::collections::HashMap;
/// use std::sync::Mutex;
///
/// use matchforge_protocol::{MatchId, SessionState};
/// use matchforge_store::{MatchStore, StoreError};
///
/// /// Keeps decoded states around without any encoding step.
/// #[derive(Default)]
/// struct PlainStore(Mutex<HashMap<MatchId, SessionState>>);
///
/// impl MatchStore for PlainStore {
///     async fn load(
///         &self,
///         match_id: &MatchId,
///     ) -> Result<Option<SessionState>, StoreError> {
///         let map = self.0.lock().map_err(|e| StoreError::Unavailable(e.to_string()))?;
///         Ok(map.get(match_id).cloned())
///     }
///
///     async fn save(
///         &self,
///         match_id: &MatchId,
///         state: &SessionState,
///     ) -> Result<(), StoreError> {
///         let mut map = self.0.lock().map_err(|e| StoreError::Unavailable(e.to_string()))?;
///         map.insert(match_id.clone(), state.clone());
///         Ok(())
///     }
/// }
/// ```
pub trait MatchStore: Send + Sync + 'static {
    /// Loads the last committed state for a match.
    fn load(
        &self,
        match_id: &MatchId,
    ) -> impl Future<Output = Result<Option<SessionState>, StoreError>> + Send;

    /// Durably records `state` as the committed state for a match.
    ///
    /// The write must be complete when the future resolves with `Ok`.
    fn save(
        &self,
        match_id: &MatchId,
        state: &SessionState,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
