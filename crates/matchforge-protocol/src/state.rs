//! The Session State data model: one authoritative snapshot per match.
//!
//! The same structure is written to the match store and broadcast to
//! both clients in every `state-sync` event, so its serde shape is part
//! of the wire contract:
//!
//! ```json
//! {
//!   "status": "waiting",
//!   "ball":  { "x": 0, "y": 0, "width": 0, "height": 0, "vx": 6, "vy": 6 },
//!   "left":  { "userId": 1, "ready": false, "user": { ... }, "score": 0, ... },
//!   "right": { "userId": 2, "ready": false, "user": { ... }, "score": 0, ... },
//!   "paused": false
//! }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{PlayerId, ProtocolError};

/// Initial ball speed on both axes. The controller never advances the
/// ball; clients read this as the serve velocity.
pub const INITIAL_BALL_SPEED: f64 = 6.0;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of a match.
///
/// Moves strictly forward, never back:
///
/// ```text
/// Waiting ──(both connected)──→ Ready ──(both confirmed)──→ Started
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Waiting,
    Ready,
    Started,
}

impl Status {
    /// The only status this one may advance to, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Waiting => Some(Self::Ready),
            Self::Ready => Some(Self::Started),
            Self::Started => None,
        }
    }

    /// Returns `true` if moving to `target` is a legal single step.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => f.write_str("waiting"),
            Self::Ready => f.write_str("ready"),
            Self::Started => f.write_str("started"),
        }
    }
}

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// One of the two fixed roles in a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Both sides, left first.
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    /// The other side of the table.
    pub fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
        }
    }
}

// ---------------------------------------------------------------------------
// PlayerSnapshot
// ---------------------------------------------------------------------------

/// Whether a player currently holds a live connection to the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Online,
    #[default]
    Offline,
}

/// A denormalized copy of a player's profile, taken when the match state
/// was first created.
///
/// This is not a live reference: later profile edits do not show up here.
/// Presence is the only part a controller writes; it is kept in two
/// shapes (`presence` and the `online` flag) because clients read both.
/// Profile fields we don't model are carried through untouched in
/// `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,

    #[serde(default)]
    pub username: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,

    #[serde(default)]
    presence: Presence,

    #[serde(default)]
    online: bool,

    /// Any further profile fields, preserved as-is.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PlayerSnapshot {
    /// Creates an offline snapshot with just an id and a display name.
    pub fn new(id: PlayerId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            avatar: None,
            presence: Presence::Offline,
            online: false,
            extra: serde_json::Map::new(),
        }
    }

    /// Sets the avatar URL.
    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }

    /// Attaches an extra profile field.
    pub fn with_extra(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn presence(&self) -> Presence {
        self.presence
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    /// Updates presence, keeping the `online` mirror in sync.
    pub fn set_presence(&mut self, presence: Presence) {
        self.presence = presence;
        self.online = presence == Presence::Online;
    }
}

// ---------------------------------------------------------------------------
// SideState / Ball
// ---------------------------------------------------------------------------

/// Everything the match knows about one side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SideState {
    pub user_id: PlayerId,
    pub ready: bool,
    pub user: PlayerSnapshot,
    pub score: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: String,
}

impl SideState {
    fn fresh(user: PlayerSnapshot) -> Self {
        Self {
            user_id: user.id,
            ready: false,
            user,
            score: 0,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            color: String::new(),
        }
    }
}

/// Physical state of the ball. Carried, never simulated, by the
/// controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub vx: f64,
    pub vy: f64,
}

impl Default for Ball {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            vx: INITIAL_BALL_SPEED,
            vy: INITIAL_BALL_SPEED,
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// How a match ended, when it ended early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Outcome {
    /// One side walked away from a started match.
    Forfeit { winner: Side, loser: Side },
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// The authoritative state of one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub status: Status,
    pub ball: Ball,
    pub left: SideState,
    pub right: SideState,

    /// Set while a participant is missing under the pause policy.
    #[serde(default)]
    pub paused: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
}

impl SessionState {
    /// Builds the initial state for a match with the given seating.
    ///
    /// All positional and score fields start at zero, the status is
    /// [`Status::Waiting`], and neither side is ready.
    pub fn fresh(left: PlayerSnapshot, right: PlayerSnapshot) -> Self {
        Self {
            status: Status::Waiting,
            ball: Ball::default(),
            left: SideState::fresh(left),
            right: SideState::fresh(right),
            paused: false,
            outcome: None,
        }
    }

    pub fn side(&self, side: Side) -> &SideState {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn side_mut(&mut self, side: Side) -> &mut SideState {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    /// Which side a player is seated on, if they play in this match.
    pub fn side_of(&self, player: PlayerId) -> Option<Side> {
        Side::BOTH
            .into_iter()
            .find(|side| self.side(*side).user_id == player)
    }

    /// Returns `true` when both sides have confirmed readiness.
    pub fn both_ready(&self) -> bool {
        self.left.ready && self.right.ready
    }

    /// Returns `true` when the start transition may fire: the match is
    /// `ready`, both sides confirmed, and it is neither paused nor decided.
    pub fn can_start(&self) -> bool {
        self.status == Status::Ready
            && self.both_ready()
            && !self.paused
            && self.outcome.is_none()
    }

    /// Checks that a stored state actually belongs to `roster`.
    ///
    /// Each side must name a distinct roster member, and the embedded
    /// profile must be the same player as the side's `userId`.
    pub fn validate(&self, roster: &[PlayerId; 2]) -> Result<(), ProtocolError> {
        if self.left.user_id == self.right.user_id {
            return Err(ProtocolError::InvalidState(format!(
                "both sides seat {}",
                self.left.user_id
            )));
        }
        for side in Side::BOTH {
            let seat = self.side(side);
            if !roster.contains(&seat.user_id) {
                return Err(ProtocolError::InvalidState(format!(
                    "{side} side seats {} who is not in the roster",
                    seat.user_id
                )));
            }
            if seat.user.id != seat.user_id {
                return Err(ProtocolError::InvalidState(format!(
                    "{side} side profile {} does not match {}",
                    seat.user.id, seat.user_id
                )));
            }
        }
        Ok(())
    }
}
