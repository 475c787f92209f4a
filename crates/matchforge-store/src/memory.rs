//! In-process match store.
//!
//! Records are kept as encoded bytes, not as live Rust values, so a
//! `MemoryStore` exercises the same encode/decode path as a real
//! database column holding serialized state.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use matchforge_protocol::{Codec, JsonCodec, MatchId, SessionState};

use crate::{MatchStore, StoreError};

/// A [`MatchStore`] backed by a `HashMap` of encoded records.
///
/// The lock is a plain `std::sync::Mutex`: it is never held across an
/// `.await`, so there is nothing for an async mutex to buy here.
pub struct MemoryStore<C: Codec = JsonCodec> {
    records: Mutex<HashMap<MatchId, Vec<u8>>>,
    codec: C,
}

impl MemoryStore<JsonCodec> {
    /// Creates an empty store that encodes with JSON.
    pub fn new() -> Self {
        Self::with_codec(JsonCodec)
    }
}

impl Default for MemoryStore<JsonCodec> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Codec> MemoryStore<C> {
    /// Creates an empty store using the given codec.
    pub fn with_codec(codec: C) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            codec,
        }
    }

    /// Imports an already-encoded record, e.g. one migrated from another
    /// backend. The bytes are not validated until they are loaded.
    pub fn insert_raw(&self, match_id: MatchId, bytes: Vec<u8>) -> Result<(), StoreError> {
        self.lock()?.insert(match_id, bytes);
        Ok(())
    }

    /// Returns the encoded record for a match, if any.
    pub fn raw(&self, match_id: &MatchId) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.lock()?.get(match_id).cloned())
    }

    /// Number of matches with a stored record.
    pub fn len(&self) -> usize {
        self.lock().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<MatchId, Vec<u8>>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }
}

impl<C: Codec> MatchStore for MemoryStore<C> {
    async fn load(&self, match_id: &MatchId) -> Result<Option<SessionState>, StoreError> {
        let Some(bytes) = self.raw(match_id)? else {
            return Ok(None);
        };
        let state = self
            .codec
            .decode(&bytes)
            .map_err(|source| StoreError::Corrupt {
                match_id: match_id.clone(),
                source,
            })?;
        tracing::trace!(%match_id, bytes = bytes.len(), "match state loaded");
        Ok(Some(state))
    }

    async fn save(&self, match_id: &MatchId, state: &SessionState) -> Result<(), StoreError> {
        let bytes = self
            .codec
            .encode(state)
            .map_err(|source| StoreError::Encode {
                match_id: match_id.clone(),
                source,
            })?;
        tracing::trace!(%match_id, bytes = bytes.len(), "match state saved");
        self.lock()?.insert(match_id.clone(), bytes);
        Ok(())
    }
}
