//! Construction inputs for a controller.

use matchforge_protocol::{MatchId, PlayerId, PlayerSnapshot, SessionState};
use rand::Rng;

// ---------------------------------------------------------------------------
// Seating
// ---------------------------------------------------------------------------

/// How the two listed players map onto the left and right sides.
///
/// Only consulted when a match has no usable prior state; once a state
/// exists, its seating is permanent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seating {
    /// First listed player on the left.
    AsListed,
    /// First listed player on the right.
    Swapped,
}

impl Seating {
    /// A fair coin flip between the two seatings.
    pub fn coin_flip<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.random_bool(0.5) {
            Self::AsListed
        } else {
            Self::Swapped
        }
    }

    /// A coin flip using the thread-local generator.
    pub fn random() -> Self {
        Self::coin_flip(&mut rand::rng())
    }

    /// Returns `(left, right)` for the given roster.
    pub fn arrange(self, players: [PlayerId; 2]) -> (PlayerId, PlayerId) {
        match self {
            Self::AsListed => (players[0], players[1]),
            Self::Swapped => (players[1], players[0]),
        }
    }
}

// ---------------------------------------------------------------------------
// MatchSetup
// ---------------------------------------------------------------------------

/// Everything a controller needs to come up for one match.
///
/// ```rust
/// use matchforge_protocol::{MatchId, PlayerId, PlayerSnapshot};
/// use matchforge_session::{MatchSetup, Seating};
///
/// let setup = MatchSetup::new(MatchId::new("m-1"), [PlayerId(1), PlayerId(2)])
///     .profile(PlayerSnapshot::new(PlayerId(1), "alice"))
///     .profile(PlayerSnapshot::new(PlayerId(2), "bob"))
///     .seating(Seating::AsListed);
/// assert_eq!(setup.players, [PlayerId(1), PlayerId(2)]);
/// ```
#[derive(Debug, Clone)]
pub struct MatchSetup {
    pub match_id: MatchId,

    /// The two participants, in no particular order.
    pub players: [PlayerId; 2],

    /// Profile snapshots to embed in a fresh state. A player without a
    /// snapshot gets a bare one carrying only their id.
    pub profiles: Vec<PlayerSnapshot>,

    /// Last committed state, if the match has one.
    pub prior: Option<SessionState>,

    /// Participants whose connections already exist when the controller
    /// comes up (a resumed match).
    pub connected: Vec<PlayerId>,

    /// Seating used if a fresh state has to be generated.
    pub seating: Seating,
}

impl MatchSetup {
    /// A setup with no profiles, no prior state, nobody connected, and a
    /// random seating.
    pub fn new(match_id: MatchId, players: [PlayerId; 2]) -> Self {
        Self {
            match_id,
            players,
            profiles: Vec::new(),
            prior: None,
            connected: Vec::new(),
            seating: Seating::random(),
        }
    }

    pub fn profile(mut self, profile: PlayerSnapshot) -> Self {
        self.profiles.push(profile);
        self
    }

    pub fn profiles(mut self, profiles: impl IntoIterator<Item = PlayerSnapshot>) -> Self {
        self.profiles.extend(profiles);
        self
    }

    pub fn prior(mut self, state: Option<SessionState>) -> Self {
        self.prior = state;
        self
    }

    pub fn connected(mut self, players: impl IntoIterator<Item = PlayerId>) -> Self {
        self.connected.extend(players);
        self
    }

    pub fn seating(mut self, seating: Seating) -> Self {
        self.seating = seating;
        self
    }

    /// The snapshot for `player`, or a bare one if none was supplied.
    pub(crate) fn snapshot_for(&self, player: PlayerId) -> PlayerSnapshot {
        self.profiles
            .iter()
            .find(|p| p.id == player)
            .cloned()
            .unwrap_or_else(|| PlayerSnapshot::new(player, String::new()))
    }
}
