//! Match registry: opens, tracks, and routes to match actors.

use std::collections::HashMap;
use std::sync::Arc;

use matchforge_protocol::{MatchId, PlayerId, PlayerSnapshot, SessionState};
use matchforge_session::{ChannelSink, MatchSetup, SessionConfig, SessionController};
use matchforge_store::MatchStore;
use tracing::{info, warn};

use crate::actor::spawn_match;
use crate::{MatchHandle, RegistryConfig, RegistryError};

/// Maps each match id to its running actor.
///
/// At most one live controller exists per match id: opening an id that
/// already has a live actor returns that actor's handle. Mutating methods
/// take `&mut self`, so callers sharing a registry across tasks wrap it in
/// a lock and get that guarantee for free.
pub struct MatchRegistry<S: MatchStore> {
    store: Arc<S>,
    session_config: SessionConfig,
    config: RegistryConfig,
    matches: HashMap<MatchId, MatchHandle>,
}

impl<S: MatchStore> MatchRegistry<S> {
    pub fn new(store: Arc<S>, session_config: SessionConfig) -> Self {
        Self {
            store,
            session_config,
            config: RegistryConfig::default(),
            matches: HashMap::new(),
        }
    }

    pub fn with_config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }

    /// Opens a match, or returns the handle of the live actor for it.
    ///
    /// Prior state is loaded from the store. A fresh match is seated by a
    /// coin flip. The `match-begin` event is emitted before the handle
    /// exists, so callers that need it should use
    /// [`open_setup`](Self::open_setup) with a pre-subscribed sink.
    pub async fn open(
        &mut self,
        match_id: MatchId,
        players: [PlayerId; 2],
        profiles: impl IntoIterator<Item = PlayerSnapshot>,
    ) -> Result<MatchHandle, RegistryError> {
        let setup = MatchSetup::new(match_id, players).profiles(profiles);
        self.open_setup(setup, ChannelSink::new()).await
    }

    /// Opens a match from a full setup, emitting into `sink`.
    ///
    /// If a live actor already exists for `setup.match_id` its handle is
    /// returned and both `setup` and `sink` are ignored. Otherwise the
    /// stored state (if any) replaces `setup.prior`. Stored bytes that no
    /// longer decode are logged and treated as no prior state.
    ///
    /// # Errors
    /// - [`RegistryError::Store`] if the store could not be read.
    /// - [`RegistryError::Session`] if the controller could not open.
    pub async fn open_setup(
        &mut self,
        setup: MatchSetup,
        sink: ChannelSink,
    ) -> Result<MatchHandle, RegistryError> {
        if let Some(handle) = self.live(&setup.match_id) {
            return Ok(handle.clone());
        }

        let prior = self.load_prior(&setup.match_id).await?;
        let setup = setup.prior(prior);
        let match_id = setup.match_id.clone();

        let controller = SessionController::open(
            setup,
            Arc::clone(&self.store),
            sink.clone(),
            self.session_config.clone(),
        )
        .await?;
        let handle = spawn_match(controller, sink, self.config.channel_size);
        self.matches.insert(match_id.clone(), handle.clone());

        info!(%match_id, matches = self.matches.len(), "match opened");
        Ok(handle)
    }

    /// Routes a connection to a match.
    pub async fn route_connect(
        &self,
        match_id: &MatchId,
        player: PlayerId,
    ) -> Result<(), RegistryError> {
        self.handle(match_id)?.connect(player).await
    }

    /// Routes a disconnection to a match.
    pub async fn route_disconnect(
        &self,
        match_id: &MatchId,
        player: PlayerId,
    ) -> Result<(), RegistryError> {
        self.handle(match_id)?.disconnect(player).await
    }

    /// Routes a ready confirmation to a match.
    pub async fn route_ready(
        &self,
        match_id: &MatchId,
        player: PlayerId,
    ) -> Result<(), RegistryError> {
        self.handle(match_id)?.set_ready(player).await
    }

    /// Returns the last committed state of a match.
    pub async fn state(&self, match_id: &MatchId) -> Result<SessionState, RegistryError> {
        self.handle(match_id)?.state().await
    }

    /// Shuts a match down and forgets it. Its persisted state stays in the
    /// store, so a later [`open`](Self::open) resumes it.
    pub async fn close(&mut self, match_id: &MatchId) -> Result<(), RegistryError> {
        let handle = self
            .matches
            .remove(match_id)
            .ok_or_else(|| RegistryError::NotFound(match_id.clone()))?;

        // An actor that already stopped has nothing left to cancel.
        let _ = handle.shutdown().await;

        info!(%match_id, matches = self.matches.len(), "match closed");
        Ok(())
    }

    /// Returns the handle for a match, if it is open.
    pub fn get(&self, match_id: &MatchId) -> Option<MatchHandle> {
        self.matches.get(match_id).cloned()
    }

    /// Number of open matches.
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Lists all open match ids.
    pub fn match_ids(&self) -> Vec<MatchId> {
        self.matches.keys().cloned().collect()
    }

    fn handle(&self, match_id: &MatchId) -> Result<&MatchHandle, RegistryError> {
        self.matches
            .get(match_id)
            .ok_or_else(|| RegistryError::NotFound(match_id.clone()))
    }

    /// The handle for `match_id` if its actor is still running.
    fn live(&self, match_id: &MatchId) -> Option<&MatchHandle> {
        self.matches.get(match_id).filter(|h| !h.is_closed())
    }

    async fn load_prior(&self, match_id: &MatchId) -> Result<Option<SessionState>, RegistryError> {
        match self.store.load(match_id).await {
            Ok(prior) => Ok(prior),
            Err(error) if error.is_corrupt() => {
                warn!(%match_id, %error, "stored state unreadable, starting fresh");
                Ok(None)
            }
            Err(error) => Err(error.into()),
        }
    }
}

impl<S: MatchStore> std::fmt::Debug for MatchRegistry<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchRegistry")
            .field("matches", &self.matches.len())
            .field("config", &self.config)
            .finish()
    }
}
