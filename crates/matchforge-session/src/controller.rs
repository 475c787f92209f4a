//! The session controller: sole owner and writer of one match's state.
//!
//! # Protocol
//!
//! ```text
//!                 both connected               both confirmed
//!   [Waiting] ───────────────────→ [Ready] ───────────────────→ [Started]
//!                                    │
//!                                    └─ ready-check heartbeat runs here
//! ```
//!
//! Every operation follows the same order: build the next state on a
//! copy, save it, adopt it, then broadcast. If the save fails the copy is
//! thrown away, the caller gets [`SessionError::Persistence`], and nothing
//! is broadcast, so clients never see a state the store doesn't have.
//!
//! # Concurrency note
//!
//! Like the room actors it lives inside, the controller takes `&mut self`
//! for every mutation and does no locking of its own. The registry runs
//! each controller in a single task, which is what keeps two near
//! simultaneous connects for the same match from racing.

use std::sync::Arc;

use matchforge_protocol::{
    MatchId, OutboundEvent, Outcome, PlayerId, Presence, SessionState, Side, Status,
};
use matchforge_store::MatchStore;
use matchforge_tick::Heartbeat;
use tracing::{debug, info, warn};

use crate::{
    ConnectionSet, DisconnectPolicy, EventSink, MatchSetup, SessionConfig, SessionError,
};

/// Runs the connect → ready → start handshake for one match.
pub struct SessionController<S: MatchStore, E: EventSink> {
    match_id: MatchId,

    /// Last committed state. Only replaced after a successful save.
    state: SessionState,

    connections: ConnectionSet,

    /// The ready-check heartbeat: `Some` while armed. Taking it out of the
    /// option is the only way it stops.
    ready_check: Option<Heartbeat>,

    config: SessionConfig,
    store: Arc<S>,
    sink: E,
}

impl<S: MatchStore, E: EventSink> SessionController<S, E> {
    /// Brings up the controller for a match.
    ///
    /// 1. Adopts `setup.prior` if it is a valid state for this roster,
    ///    otherwise generates a fresh one using `setup.seating`.
    /// 2. Marks `setup.connected` players online and, if that completes
    ///    the roster, runs the ready transition.
    /// 3. Persists the result if anything changed, then emits
    ///    `match-begin`.
    ///
    /// # Errors
    /// - [`SessionError::InvalidRoster`] if both roster slots name the
    ///   same player.
    /// - [`SessionError::Persistence`] if the initial save fails.
    pub async fn open(
        setup: MatchSetup,
        store: Arc<S>,
        sink: E,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let [a, b] = setup.players;
        if a == b {
            return Err(SessionError::InvalidRoster {
                match_id: setup.match_id,
                player: a,
            });
        }

        let prior = setup.prior.clone().and_then(|state| {
            match state.validate(&setup.players) {
                Ok(()) => Some(state),
                Err(error) => {
                    warn!(
                        match_id = %setup.match_id,
                        %error,
                        "discarding malformed prior state"
                    );
                    None
                }
            }
        });

        let (state, mut dirty) = match prior {
            Some(state) => (state, false),
            None => {
                let (left, right) = setup.seating.arrange(setup.players);
                let state = SessionState::fresh(
                    setup.snapshot_for(left),
                    setup.snapshot_for(right),
                );
                (state, true)
            }
        };

        let mut controller = Self {
            match_id: setup.match_id,
            state,
            connections: ConnectionSet::new(setup.players),
            ready_check: None,
            config,
            store,
            sink,
        };

        for player in setup.connected {
            if controller.connections.insert(player) {
                if let Some(side) = controller.state.side_of(player) {
                    controller
                        .state
                        .side_mut(side)
                        .user
                        .set_presence(Presence::Online);
                    dirty = true;
                }
            }
        }
        if controller.connections.is_complete() {
            dirty |= complete_roster(&mut controller.state);
        }

        if dirty {
            // Nothing is committed yet, so a failed save simply drops the
            // controller.
            persist(&*controller.store, &controller.match_id, &controller.state).await?;
        }
        controller.arm_ready_check_if_due();

        info!(
            match_id = %controller.match_id,
            left = %controller.state.left.user_id,
            right = %controller.state.right.user_id,
            status = %controller.state.status,
            persisted = dirty,
            "session opened"
        );

        controller
            .sink
            .emit(OutboundEvent::MatchBegin(controller.match_id.clone()));
        Ok(controller)
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Handles a participant's connection.
    ///
    /// Marks them online (once per connection) and, when both players are
    /// connected, moves a waiting match to `ready` and arms the
    /// ready-check. Always ends with one `state-sync`.
    ///
    /// Ids outside the roster are ignored: no state change, no event.
    pub async fn on_connect(&mut self, player: PlayerId) -> Result<(), SessionError> {
        let Some(side) = self.participant_side(player) else {
            return Ok(());
        };

        let newly_connected = self.connections.insert(player);
        let mut next = self.state.clone();
        let mut changed = false;

        if newly_connected {
            next.side_mut(side).user.set_presence(Presence::Online);
            changed = true;
        }
        let entering_ready =
            self.connections.is_complete() && next.status == Status::Waiting;
        if self.connections.is_complete() {
            changed |= complete_roster(&mut next);
        }

        if changed {
            if let Err(error) = self.commit(next).await {
                if newly_connected {
                    self.connections.remove(player);
                }
                return Err(error);
            }
        }

        if newly_connected {
            info!(match_id = %self.match_id, %player, %side, "player connected");
        }
        if entering_ready {
            info!(match_id = %self.match_id, "both players connected, match ready");
        }
        self.arm_ready_check_if_due();
        self.sync();
        Ok(())
    }

    /// Handles a participant's disconnection.
    ///
    /// Marks them offline and applies the configured
    /// [`DisconnectPolicy`]. The status is never reverted. Ends with one
    /// `state-sync`.
    pub async fn on_disconnect(&mut self, player: PlayerId) -> Result<(), SessionError> {
        let Some(side) = self.participant_side(player) else {
            return Ok(());
        };

        let was_connected = self.connections.remove(player);
        let mut next = self.state.clone();
        next.side_mut(side).user.set_presence(Presence::Offline);

        let mut silence_ready_check = false;
        let undecided = next.outcome.is_none();
        match self.config.disconnect_policy {
            DisconnectPolicy::Ignore => {}
            DisconnectPolicy::Pause => {
                if next.status != Status::Waiting && undecided {
                    next.paused = true;
                    silence_ready_check = true;
                }
            }
            DisconnectPolicy::Forfeit => {
                if next.status == Status::Started && undecided {
                    next.outcome = Some(Outcome::Forfeit {
                        winner: side.opposite(),
                        loser: side,
                    });
                }
            }
        }

        self.commit(next).await?;
        if silence_ready_check {
            self.stop_ready_check();
        }

        info!(
            match_id = %self.match_id,
            %player,
            %side,
            was_connected,
            policy = %self.config.disconnect_policy,
            "player disconnected"
        );
        if let (true, Some(Outcome::Forfeit { winner, .. })) = (undecided, self.state.outcome) {
            info!(match_id = %self.match_id, %winner, "match forfeited");
        }
        self.sync();
        Ok(())
    }

    /// Records that a participant confirmed readiness.
    ///
    /// Only the participant can set their own side's flag. The flag is
    /// persisted and broadcast; if that leaves a `ready` match with both
    /// flags set, the start transition runs and broadcasts again.
    pub async fn set_ready(&mut self, player: PlayerId) -> Result<(), SessionError> {
        let Some(side) = self.participant_side(player) else {
            return Ok(());
        };
        if self.state.outcome.is_some() {
            debug!(match_id = %self.match_id, %player, "match decided, ignoring ready");
            return Ok(());
        }

        if !self.state.side(side).ready {
            let mut next = self.state.clone();
            next.side_mut(side).ready = true;
            self.commit(next).await?;
            info!(match_id = %self.match_id, %player, %side, "player ready");
        }
        self.sync();

        if self.state.can_start() {
            self.start().await?;
        }
        Ok(())
    }

    /// Waits for the next ready-check beat and emits `ready-check`.
    ///
    /// Returns the beat number. While no ready-check is armed the future
    /// pends forever, which lets a match actor keep it in its `select!`
    /// loop unconditionally.
    pub async fn ready_check(&mut self) -> u64 {
        let Some(heartbeat) = self.ready_check.as_mut() else {
            return std::future::pending().await;
        };
        let beat = heartbeat.tick().await;
        self.sink.emit(OutboundEvent::ReadyCheck);
        beat.seq
    }

    /// Stops background activity. Call when the match is torn down.
    pub fn shutdown(&mut self) {
        self.stop_ready_check();
        info!(match_id = %self.match_id, status = %self.state.status, "session shut down");
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn match_id(&self) -> &MatchId {
        &self.match_id
    }

    /// The last committed state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn connections(&self) -> &ConnectionSet {
        &self.connections
    }

    /// Returns `true` while the ready-check heartbeat is armed.
    pub fn is_ready_check_armed(&self) -> bool {
        self.ready_check.is_some()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn start(&mut self) -> Result<(), SessionError> {
        let mut next = self.state.clone();
        next.status = Status::Started;
        self.commit(next).await?;
        self.stop_ready_check();
        info!(match_id = %self.match_id, "match started");
        self.sync();
        Ok(())
    }

    /// Resolves a caller to their side, or `None` (logged) for anyone
    /// outside the roster.
    fn participant_side(&self, player: PlayerId) -> Option<Side> {
        if !self.connections.is_participant(player) {
            debug!(match_id = %self.match_id, %player, "ignoring non-participant");
            return None;
        }
        self.state.side_of(player)
    }

    /// Saves `next` and adopts it as the committed state.
    async fn commit(&mut self, next: SessionState) -> Result<(), SessionError> {
        persist(&*self.store, &self.match_id, &next).await?;
        self.state = next;
        Ok(())
    }

    /// Arms the ready-check if the match is ready, unpaused, undecided,
    /// fully connected, and not already beating.
    fn arm_ready_check_if_due(&mut self) {
        let due = self.state.status == Status::Ready
            && self.state.outcome.is_none()
            && !self.state.paused
            && self.connections.is_complete()
            && self.ready_check.is_none();
        if due {
            self.ready_check = Some(Heartbeat::start(self.config.ready_check.clone()));
            debug!(match_id = %self.match_id, "ready-check armed");
        }
    }

    fn stop_ready_check(&mut self) {
        if let Some(heartbeat) = self.ready_check.take() {
            let beats = heartbeat.stop();
            debug!(match_id = %self.match_id, beats, "ready-check stopped");
        }
    }

    fn sync(&self) {
        self.sink.emit(OutboundEvent::StateSync(self.state.clone()));
    }
}

async fn persist<S: MatchStore>(
    store: &S,
    match_id: &MatchId,
    state: &SessionState,
) -> Result<(), SessionError> {
    store.save(match_id, state).await.map_err(|source| {
        warn!(%match_id, error = %source, "failed to persist match state");
        SessionError::Persistence {
            match_id: match_id.clone(),
            source,
        }
    })
}

/// Applies "both participants are connected" to a state. Returns `true`
/// if anything changed.
fn complete_roster(state: &mut SessionState) -> bool {
    let mut changed = false;
    if state.paused {
        state.paused = false;
        changed = true;
    }
    if state.status == Status::Waiting {
        state.status = Status::Ready;
        changed = true;
    }
    changed
}

impl<S: MatchStore, E: EventSink> std::fmt::Debug for SessionController<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("match_id", &self.match_id)
            .field("status", &self.state.status)
            .field("connections", &self.connections)
            .field("ready_check", &self.ready_check)
            .finish()
    }
}
