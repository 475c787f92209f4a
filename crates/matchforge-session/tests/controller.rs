//! Integration tests for `SessionController`.
//!
//! Every test observes the controller the way a client would: through an
//! event stream subscribed on a `ChannelSink`, plus whatever the match
//! store holds. Heartbeat timing uses Tokio's paused clock.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use matchforge_protocol::{
    Codec, JsonCodec, MatchId, OutboundEvent, Outcome, PlayerId, PlayerSnapshot, Presence,
    SessionState, Side, Status,
};
use matchforge_session::{
    ChannelSink, DisconnectPolicy, EventReceiver, MatchSetup, Seating, SessionConfig,
    SessionController, SessionError,
};
use matchforge_store::{MatchStore, MemoryStore, StoreError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// =========================================================================
// Fakes
// =========================================================================

/// A memory store whose writes can be made to fail on demand.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    failing: AtomicBool,
    /// Successful saves left before writes start failing. `None` is
    /// unlimited.
    allowance: Mutex<Option<usize>>,
    saves: AtomicUsize,
}

impl FlakyStore {
    fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
        *self.allowance.lock().unwrap() = None;
    }

    fn fail_after(&self, saves: usize) {
        *self.allowance.lock().unwrap() = Some(saves);
    }

    fn spend_allowance(&self) -> bool {
        match self.allowance.lock().unwrap().as_mut() {
            Some(0) => false,
            Some(left) => {
                *left -= 1;
                true
            }
            None => true,
        }
    }

    fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl MatchStore for FlakyStore {
    async fn load(&self, match_id: &MatchId) -> Result<Option<SessionState>, StoreError> {
        self.inner.load(match_id).await
    }

    async fn save(&self, match_id: &MatchId, state: &SessionState) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("disk full".into()));
        }
        if !self.spend_allowance() {
            return Err(StoreError::Unavailable("disk full".into()));
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(match_id, state).await
    }
}

type Controller = SessionController<FlakyStore, ChannelSink>;

// =========================================================================
// Helpers
// =========================================================================

const P1: PlayerId = PlayerId(1);
const P2: PlayerId = PlayerId(2);
const STRANGER: PlayerId = PlayerId(99);
/// Observer id used to subscribe to the match's event stream.
const OBSERVER: PlayerId = PlayerId(1_000);

fn match_id() -> MatchId {
    MatchId::new("m-1")
}

fn setup() -> MatchSetup {
    MatchSetup::new(match_id(), [P1, P2])
        .profile(PlayerSnapshot::new(P1, "alice"))
        .profile(PlayerSnapshot::new(P2, "bob"))
        .seating(Seating::AsListed)
}

fn config(policy: DisconnectPolicy) -> SessionConfig {
    SessionConfig::default().with_disconnect_policy(policy)
}

struct Harness {
    ctrl: Controller,
    store: Arc<FlakyStore>,
    events: EventReceiver,
}

async fn open_with(setup: MatchSetup, config: SessionConfig) -> Harness {
    let store = Arc::new(FlakyStore::default());
    open_on(store, setup, config).await
}

async fn open_on(store: Arc<FlakyStore>, setup: MatchSetup, config: SessionConfig) -> Harness {
    let sink = ChannelSink::new();
    let events = sink.subscribe(OBSERVER);
    let ctrl = SessionController::open(setup, Arc::clone(&store), sink, config)
        .await
        .expect("open should succeed");
    Harness { ctrl, store, events }
}

async fn open() -> Harness {
    open_with(setup(), SessionConfig::default()).await
}

/// Opens a match and connects both players, discarding the events.
async fn open_ready(policy: DisconnectPolicy) -> Harness {
    let mut h = open_with(setup(), config(policy)).await;
    h.ctrl.on_connect(P1).await.unwrap();
    h.ctrl.on_connect(P2).await.unwrap();
    drain(&mut h.events);
    h
}

fn drain(rx: &mut EventReceiver) -> Vec<OutboundEvent> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event);
    }
    out
}

fn syncs(events: &[OutboundEvent]) -> Vec<&SessionState> {
    events
        .iter()
        .filter_map(|e| match e {
            OutboundEvent::StateSync(s) => Some(s),
            _ => None,
        })
        .collect()
}

fn encoded(state: &SessionState) -> Vec<u8> {
    JsonCodec.encode(state).unwrap()
}

async fn stored(store: &FlakyStore) -> SessionState {
    store.load(&match_id()).await.unwrap().expect("state persisted")
}

// =========================================================================
// Construction (scenario A)
// =========================================================================

#[tokio::test]
async fn test_open_fresh_seats_players_and_waits() {
    let mut h = open().await;

    let state = h.ctrl.state();
    assert_eq!(state.status, Status::Waiting);
    assert_eq!(state.left.user_id, P1);
    assert_eq!(state.right.user_id, P2);
    assert_eq!(state.left.user.username, "alice");
    assert!(!h.ctrl.is_ready_check_armed());

    let events = drain(&mut h.events);
    assert_eq!(events, vec![OutboundEvent::MatchBegin(match_id())]);
}

#[tokio::test]
async fn test_open_fresh_persists_initial_state() {
    let h = open().await;
    assert_eq!(h.store.saves(), 1);
    assert_eq!(&stored(&h.store).await, h.ctrl.state());
}

#[tokio::test]
async fn test_open_random_seating_is_one_of_two_permutations() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut seen_left = Vec::new();
    for _ in 0..32 {
        let seating = Seating::coin_flip(&mut rng);
        let h = open_with(setup().seating(seating), SessionConfig::default()).await;
        let s = h.ctrl.state();
        let pair = (s.left.user_id, s.right.user_id);
        assert!(pair == (P1, P2) || pair == (P2, P1), "unexpected seating {pair:?}");
        seen_left.push(s.left.user_id);
    }
    assert!(seen_left.contains(&P1) && seen_left.contains(&P2));
}

#[tokio::test]
async fn test_open_with_prior_state_keeps_its_seating() {
    let mut prior = SessionState::fresh(
        PlayerSnapshot::new(P2, "bob"),
        PlayerSnapshot::new(P1, "alice"),
    );
    prior.left.score = 4;

    let h = open_with(
        setup().prior(Some(prior.clone())).seating(Seating::AsListed),
        SessionConfig::default(),
    )
    .await;

    assert_eq!(h.ctrl.state(), &prior);
    assert_eq!(h.ctrl.state().left.user_id, P2);
    assert_eq!(h.store.saves(), 0, "valid prior state is not rewritten");
}

#[tokio::test]
async fn test_open_with_foreign_prior_state_starts_fresh() {
    let prior = SessionState::fresh(
        PlayerSnapshot::new(PlayerId(7), "mallory"),
        PlayerSnapshot::new(P1, "alice"),
    );

    let h = open_with(setup().prior(Some(prior)), SessionConfig::default()).await;

    assert_eq!(h.ctrl.state().left.user_id, P1);
    assert_eq!(h.ctrl.state().right.user_id, P2);
    assert_eq!(h.store.saves(), 1);
}

#[tokio::test]
async fn test_open_missing_profile_gets_bare_snapshot() {
    let setup = MatchSetup::new(match_id(), [P1, P2]).seating(Seating::AsListed);
    let h = open_with(setup, SessionConfig::default()).await;
    assert_eq!(h.ctrl.state().right.user.id, P2);
    assert!(h.ctrl.state().right.user.username.is_empty());
}

#[tokio::test]
async fn test_open_duplicate_roster_is_rejected() {
    let result = SessionController::open(
        MatchSetup::new(match_id(), [P1, P1]),
        Arc::new(FlakyStore::default()),
        ChannelSink::new(),
        SessionConfig::default(),
    )
    .await;
    assert!(matches!(
        result,
        Err(SessionError::InvalidRoster { player, .. }) if player == P1
    ));
}

#[tokio::test]
async fn test_open_fails_when_initial_save_fails() {
    let store = Arc::new(FlakyStore::default());
    store.fail_writes(true);
    let sink = ChannelSink::new();
    let mut events = sink.subscribe(OBSERVER);

    let result =
        SessionController::open(setup(), Arc::clone(&store), sink, SessionConfig::default()).await;

    assert!(matches!(result, Err(SessionError::Persistence { .. })));
    assert!(drain(&mut events).is_empty(), "no match-begin for an uncommitted match");
}

#[tokio::test(start_paused = true)]
async fn test_open_with_full_roster_connected_goes_ready() {
    let mut h = open_with(setup().connected([P1, P2]), SessionConfig::default()).await;

    assert_eq!(h.ctrl.state().status, Status::Ready);
    assert!(h.ctrl.state().left.user.is_online());
    assert!(h.ctrl.is_ready_check_armed());
    assert_eq!(stored(&h.store).await.status, Status::Ready);
    assert_eq!(drain(&mut h.events), vec![OutboundEvent::MatchBegin(match_id())]);
}

#[tokio::test(start_paused = true)]
async fn test_open_resumed_ready_match_waits_for_roster_before_beating() {
    let mut prior = SessionState::fresh(
        PlayerSnapshot::new(P1, "alice"),
        PlayerSnapshot::new(P2, "bob"),
    );
    prior.status = Status::Ready;

    let mut h = open_with(setup().prior(Some(prior)), SessionConfig::default()).await;
    assert!(!h.ctrl.is_ready_check_armed());

    h.ctrl.on_connect(P1).await.unwrap();
    assert!(!h.ctrl.is_ready_check_armed());
    h.ctrl.on_connect(P2).await.unwrap();
    assert!(h.ctrl.is_ready_check_armed());
    assert_eq!(h.ctrl.state().status, Status::Ready);
}

// =========================================================================
// on_connect (scenario B)
// =========================================================================

#[tokio::test]
async fn test_connect_marks_side_online_and_persists() {
    let mut h = open().await;
    drain(&mut h.events);

    h.ctrl.on_connect(P2).await.unwrap();

    assert_eq!(h.ctrl.state().right.user.presence(), Presence::Online);
    assert_eq!(h.ctrl.state().status, Status::Waiting);
    assert!(h.ctrl.connections().contains(P2));
    assert_eq!(stored(&h.store).await.right.user.presence(), Presence::Online);

    let events = drain(&mut h.events);
    assert_eq!(events.len(), 1);
    assert_eq!(syncs(&events)[0], h.ctrl.state());
}

#[tokio::test(start_paused = true)]
async fn test_connect_both_moves_to_ready_and_arms_heartbeat() {
    let mut h = open().await;
    h.ctrl.on_connect(P1).await.unwrap();
    h.ctrl.on_connect(P2).await.unwrap();

    assert_eq!(h.ctrl.state().status, Status::Ready);
    assert!(h.ctrl.is_ready_check_armed());
    assert_eq!(stored(&h.store).await.status, Status::Ready);

    let events = drain(&mut h.events);
    let synced = syncs(&events);
    assert_eq!(synced.len(), 2, "one state-sync per connect");
    assert_eq!(synced[1].status, Status::Ready);
}

#[tokio::test(start_paused = true)]
async fn test_ready_check_beats_on_fixed_period() {
    let mut h = open_ready(DisconnectPolicy::Ignore).await;

    for expected in 1..=3 {
        let start = tokio::time::Instant::now();
        let seq = tokio::time::timeout(Duration::from_millis(1_500), h.ctrl.ready_check())
            .await
            .expect("ready-check should fire within one period");
        assert_eq!(seq, expected);
        assert!(start.elapsed() >= Duration::from_millis(999));
    }

    let events = drain(&mut h.events);
    assert_eq!(events, vec![OutboundEvent::ReadyCheck; 3]);
}

#[tokio::test(start_paused = true)]
async fn test_repeated_connect_does_not_retrigger_ready() {
    let mut h = open_ready(DisconnectPolicy::Ignore).await;
    let saves = h.store.saves();

    h.ctrl.on_connect(P1).await.unwrap();

    assert_eq!(h.store.saves(), saves, "nothing changed, nothing saved");
    let events = drain(&mut h.events);
    assert_eq!(syncs(&events).len(), 1, "still exactly one state-sync");

    // Still a single heartbeat: one beat per period.
    let seq = tokio::time::timeout(Duration::from_millis(1_100), h.ctrl.ready_check())
        .await
        .unwrap();
    assert_eq!(seq, 1);
}

#[tokio::test(start_paused = true)]
async fn test_connect_stranger_is_silent_no_op() {
    let mut h = open_ready(DisconnectPolicy::Ignore).await;
    let before = encoded(h.ctrl.state());
    let saves = h.store.saves();

    h.ctrl.on_connect(STRANGER).await.unwrap();

    assert_eq!(encoded(h.ctrl.state()), before);
    assert_eq!(h.store.saves(), saves);
    assert!(!h.ctrl.connections().contains(STRANGER));
    assert!(drain(&mut h.events).is_empty());
}

#[tokio::test]
async fn test_connect_failure_rolls_back_and_stays_silent() {
    let mut h = open().await;
    drain(&mut h.events);
    let before = h.ctrl.state().clone();
    h.store.fail_writes(true);

    let err = h.ctrl.on_connect(P1).await.unwrap_err();

    assert!(matches!(err, SessionError::Persistence { .. }));
    assert_eq!(h.ctrl.state(), &before);
    assert!(!h.ctrl.connections().contains(P1));
    assert!(drain(&mut h.events).is_empty());

    // Once the store recovers, retrying the same connect succeeds.
    h.store.fail_writes(false);
    h.ctrl.on_connect(P1).await.unwrap();
    assert!(h.ctrl.state().left.user.is_online());
    assert_eq!(syncs(&drain(&mut h.events)).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_connect_failure_on_roster_completion_stays_waiting() {
    let mut h = open().await;
    h.ctrl.on_connect(P1).await.unwrap();
    h.store.fail_writes(true);

    assert!(h.ctrl.on_connect(P2).await.is_err());
    assert_eq!(h.ctrl.state().status, Status::Waiting);
    assert!(!h.ctrl.is_ready_check_armed());
    assert_eq!(stored(&h.store).await.status, Status::Waiting);
}

// =========================================================================
// on_disconnect (scenario C)
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_disconnect_marks_offline_without_reverting_status() {
    let mut h = open_ready(DisconnectPolicy::Ignore).await;

    h.ctrl.on_disconnect(P1).await.unwrap();

    let state = h.ctrl.state();
    assert_eq!(state.left.user.presence(), Presence::Offline);
    assert!(!state.left.user.is_online());
    assert_eq!(state.status, Status::Ready);
    assert!(!state.paused);
    assert!(!h.ctrl.connections().contains(P1));
    assert_eq!(stored(&h.store).await.left.user.presence(), Presence::Offline);

    let events = drain(&mut h.events);
    assert_eq!(syncs(&events).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_restores_online_presence() {
    let mut h = open_ready(DisconnectPolicy::Ignore).await;
    h.ctrl.on_disconnect(P1).await.unwrap();
    h.ctrl.on_connect(P1).await.unwrap();

    assert!(h.ctrl.state().left.user.is_online());
    assert_eq!(h.ctrl.state().status, Status::Ready);
    assert!(h.ctrl.connections().is_complete());
}

#[tokio::test(start_paused = true)]
async fn test_ignore_policy_keeps_heartbeat_through_disconnect() {
    let mut h = open_ready(DisconnectPolicy::Ignore).await;
    h.ctrl.on_disconnect(P2).await.unwrap();

    assert!(h.ctrl.is_ready_check_armed());
    let beat = tokio::time::timeout(Duration::from_millis(1_100), h.ctrl.ready_check()).await;
    assert!(beat.is_ok());
}

#[tokio::test]
async fn test_disconnect_stranger_is_silent_no_op() {
    let mut h = open().await;
    h.ctrl.on_connect(P1).await.unwrap();
    drain(&mut h.events);
    let before = encoded(h.ctrl.state());

    h.ctrl.on_disconnect(STRANGER).await.unwrap();

    assert_eq!(encoded(h.ctrl.state()), before);
    assert!(drain(&mut h.events).is_empty());
}

#[tokio::test]
async fn test_disconnect_failure_keeps_committed_state() {
    let mut h = open().await;
    h.ctrl.on_connect(P1).await.unwrap();
    drain(&mut h.events);
    h.store.fail_writes(true);

    assert!(h.ctrl.on_disconnect(P1).await.is_err());
    assert!(h.ctrl.state().left.user.is_online());
    assert!(drain(&mut h.events).is_empty());
}

// =========================================================================
// set_ready / start (scenario D)
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_set_ready_persists_flag() {
    let mut h = open_ready(DisconnectPolicy::Ignore).await;

    h.ctrl.set_ready(P1).await.unwrap();

    assert!(h.ctrl.state().left.ready);
    assert!(!h.ctrl.state().right.ready);
    assert_eq!(h.ctrl.state().status, Status::Ready);
    assert!(stored(&h.store).await.left.ready);
    assert_eq!(syncs(&drain(&mut h.events)).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_both_ready_starts_match_and_stops_heartbeat() {
    let mut h = open_ready(DisconnectPolicy::Ignore).await;

    h.ctrl.set_ready(P1).await.unwrap();
    h.ctrl.set_ready(P2).await.unwrap();

    let state = h.ctrl.state();
    assert_eq!(state.status, Status::Started);
    assert!(state.left.ready && state.right.ready);
    assert!(!h.ctrl.is_ready_check_armed());
    assert_eq!(stored(&h.store).await.status, Status::Started);

    let events = drain(&mut h.events);
    let last = syncs(&events).pop().expect("final state-sync");
    assert_eq!(last.status, Status::Started);
    assert!(last.left.ready && last.right.ready);

    let beat = tokio::time::timeout(Duration::from_secs(5), h.ctrl.ready_check()).await;
    assert!(beat.is_err(), "no ready-check after the match started");
    assert!(drain(&mut h.events).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_no_ready_check_after_started_sync() {
    let mut h = open_ready(DisconnectPolicy::Ignore).await;

    tokio::time::timeout(Duration::from_millis(1_100), h.ctrl.ready_check())
        .await
        .unwrap();
    h.ctrl.set_ready(P2).await.unwrap();
    h.ctrl.set_ready(P1).await.unwrap();
    let _ = tokio::time::timeout(Duration::from_secs(3), h.ctrl.ready_check()).await;

    let events = drain(&mut h.events);
    let started_at = events
        .iter()
        .position(|e| matches!(e, OutboundEvent::StateSync(s) if s.status == Status::Started))
        .expect("started sync emitted");
    assert!(
        events[started_at..]
            .iter()
            .all(|e| !matches!(e, OutboundEvent::ReadyCheck))
    );
    assert_eq!(events[0], OutboundEvent::ReadyCheck);
}

#[tokio::test]
async fn test_set_ready_while_waiting_does_not_start() {
    let mut h = open().await;

    h.ctrl.set_ready(P1).await.unwrap();
    h.ctrl.set_ready(P2).await.unwrap();

    assert_eq!(h.ctrl.state().status, Status::Waiting);
    assert!(h.ctrl.state().both_ready());
    assert!(stored(&h.store).await.both_ready());
}

#[tokio::test(start_paused = true)]
async fn test_ready_flags_set_early_start_on_next_confirmation() {
    let mut h = open().await;
    h.ctrl.set_ready(P1).await.unwrap();
    h.ctrl.set_ready(P2).await.unwrap();
    h.ctrl.on_connect(P1).await.unwrap();
    h.ctrl.on_connect(P2).await.unwrap();
    assert_eq!(h.ctrl.state().status, Status::Ready);

    // A repeated confirmation (prompted by the ready-check) starts it.
    h.ctrl.set_ready(P1).await.unwrap();
    assert_eq!(h.ctrl.state().status, Status::Started);
}

#[tokio::test(start_paused = true)]
async fn test_repeated_set_ready_rebroadcasts_without_saving() {
    let mut h = open_ready(DisconnectPolicy::Ignore).await;
    h.ctrl.set_ready(P1).await.unwrap();
    drain(&mut h.events);
    let saves = h.store.saves();

    h.ctrl.set_ready(P1).await.unwrap();

    assert_eq!(h.store.saves(), saves);
    assert_eq!(syncs(&drain(&mut h.events)).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_set_ready_stranger_is_silent_no_op() {
    let mut h = open_ready(DisconnectPolicy::Ignore).await;
    let before = encoded(h.ctrl.state());

    h.ctrl.set_ready(STRANGER).await.unwrap();

    assert_eq!(encoded(h.ctrl.state()), before);
    assert!(drain(&mut h.events).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_set_ready_failure_leaves_flag_unset() {
    let mut h = open_ready(DisconnectPolicy::Ignore).await;
    h.store.fail_writes(true);

    let err = h.ctrl.set_ready(P1).await.unwrap_err();

    assert!(matches!(err, SessionError::Persistence { .. }));
    assert!(!h.ctrl.state().left.ready);
    assert!(drain(&mut h.events).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_start_failure_keeps_ready_and_heartbeat() {
    let mut h = open_ready(DisconnectPolicy::Ignore).await;
    h.ctrl.set_ready(P1).await.unwrap();
    drain(&mut h.events);

    // The flag save goes through, the start save does not.
    h.store.fail_after(1);
    let err = h.ctrl.set_ready(P2).await.unwrap_err();

    assert!(matches!(err, SessionError::Persistence { .. }));
    assert!(h.ctrl.state().right.ready);
    assert_eq!(h.ctrl.state().status, Status::Ready);
    assert!(h.ctrl.is_ready_check_armed());
    assert_eq!(stored(&h.store).await.status, Status::Ready);
    let events = drain(&mut h.events);
    assert_eq!(syncs(&events).len(), 1, "only the flag sync went out");

    // A later confirmation retries the start.
    h.store.fail_writes(false);
    h.ctrl.set_ready(P2).await.unwrap();
    assert_eq!(h.ctrl.state().status, Status::Started);
    assert!(!h.ctrl.is_ready_check_armed());
}

// =========================================================================
// Disconnect policies
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_pause_policy_silences_and_resumes_ready_check() {
    let mut h = open_ready(DisconnectPolicy::Pause).await;

    h.ctrl.on_disconnect(P1).await.unwrap();
    assert!(h.ctrl.state().paused);
    assert_eq!(h.ctrl.state().status, Status::Ready);
    assert!(!h.ctrl.is_ready_check_armed());
    let silent = tokio::time::timeout(Duration::from_secs(3), h.ctrl.ready_check()).await;
    assert!(silent.is_err());

    h.ctrl.on_connect(P1).await.unwrap();
    assert!(!h.ctrl.state().paused);
    assert!(h.ctrl.is_ready_check_armed());
    assert!(!stored(&h.store).await.paused);
}

#[tokio::test(start_paused = true)]
async fn test_pause_policy_blocks_start_until_roster_returns() {
    let mut h = open_ready(DisconnectPolicy::Pause).await;
    h.ctrl.set_ready(P1).await.unwrap();
    h.ctrl.on_disconnect(P2).await.unwrap();

    h.ctrl.set_ready(P2).await.unwrap();
    assert_eq!(h.ctrl.state().status, Status::Ready);

    h.ctrl.on_connect(P2).await.unwrap();
    h.ctrl.set_ready(P2).await.unwrap();
    assert_eq!(h.ctrl.state().status, Status::Started);
}

#[tokio::test]
async fn test_pause_policy_ignores_disconnect_while_waiting() {
    let mut h = open_with(setup(), config(DisconnectPolicy::Pause)).await;
    h.ctrl.on_connect(P1).await.unwrap();
    h.ctrl.on_disconnect(P1).await.unwrap();
    assert!(!h.ctrl.state().paused);
}

#[tokio::test(start_paused = true)]
async fn test_forfeit_policy_decides_started_match() {
    let mut h = open_ready(DisconnectPolicy::Forfeit).await;
    h.ctrl.set_ready(P1).await.unwrap();
    h.ctrl.set_ready(P2).await.unwrap();

    h.ctrl.on_disconnect(P2).await.unwrap();

    let expected = Some(Outcome::Forfeit {
        winner: Side::Left,
        loser: Side::Right,
    });
    assert_eq!(h.ctrl.state().outcome, expected);
    assert_eq!(h.ctrl.state().status, Status::Started);
    assert_eq!(stored(&h.store).await.outcome, expected);

    // The first forfeit stands.
    h.ctrl.on_disconnect(P1).await.unwrap();
    assert_eq!(h.ctrl.state().outcome, expected);
}

#[tokio::test(start_paused = true)]
async fn test_forfeit_policy_before_start_behaves_like_ignore() {
    let mut h = open_ready(DisconnectPolicy::Forfeit).await;
    h.ctrl.on_disconnect(P1).await.unwrap();

    assert!(h.ctrl.state().outcome.is_none());
    assert!(h.ctrl.is_ready_check_armed());
}

// =========================================================================
// Teardown
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_ready_check() {
    let mut h = open_ready(DisconnectPolicy::Ignore).await;
    h.ctrl.shutdown();
    assert!(!h.ctrl.is_ready_check_armed());
    let beat = tokio::time::timeout(Duration::from_secs(3), h.ctrl.ready_check()).await;
    assert!(beat.is_err());
}

// =========================================================================
// Model-based: status never regresses
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_status_is_monotonic_under_random_operations() {
    let players = [P1, P2, STRANGER];
    for policy in [
        DisconnectPolicy::Ignore,
        DisconnectPolicy::Pause,
        DisconnectPolicy::Forfeit,
    ] {
        for seed in 0..20u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut h = open_with(
                setup().seating(Seating::coin_flip(&mut rng)),
                config(policy),
            )
            .await;
            let mut last = h.ctrl.state().status;

            for _ in 0..40 {
                let player = players[rng.random_range(0..players.len())];
                let before = h.ctrl.state().clone();
                let op = rng.random_range(0..3);
                match op {
                    0 => h.ctrl.on_connect(player).await.unwrap(),
                    1 => h.ctrl.on_disconnect(player).await.unwrap(),
                    _ => h.ctrl.set_ready(player).await.unwrap(),
                }
                let now = h.ctrl.state();

                assert!(now.status >= last, "status regressed: {last} -> {}", now.status);
                if before.status == Status::Waiting && now.status == Status::Ready {
                    assert_eq!(op, 0, "only a connect makes a match ready");
                    assert!(h.ctrl.connections().is_complete());
                }
                if before.status != Status::Started && now.status == Status::Started {
                    assert_eq!(op, 2, "only a confirmation starts a match");
                    assert!(now.both_ready());
                }
                if h.ctrl.is_ready_check_armed() {
                    assert_eq!(now.status, Status::Ready);
                }
                if player == STRANGER {
                    assert_eq!(encoded(now), encoded(&before));
                }
                assert_eq!(&stored(&h.store).await, now, "memory and store diverged");
                last = now.status;
            }
        }
    }
}
