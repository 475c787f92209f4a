//! The Connection Set: which participants are connected right now.

use matchforge_protocol::PlayerId;

/// The subset of a match's two participants that currently hold a live
/// connection.
///
/// Membership is capped at the roster: ids outside it are rejected, so
/// the set can never hold more than two players or anyone who doesn't
/// play in this match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSet {
    roster: [PlayerId; 2],
    connected: [bool; 2],
}

impl ConnectionSet {
    /// An empty set for the given roster.
    pub fn new(roster: [PlayerId; 2]) -> Self {
        Self {
            roster,
            connected: [false; 2],
        }
    }

    /// Marks a participant connected.
    ///
    /// Returns `true` only if the player is in the roster and was not
    /// already connected.
    pub fn insert(&mut self, player: PlayerId) -> bool {
        match self.slot(player) {
            Some(i) if !self.connected[i] => {
                self.connected[i] = true;
                true
            }
            _ => false,
        }
    }

    /// Marks a participant disconnected. Returns `true` if they were
    /// connected.
    pub fn remove(&mut self, player: PlayerId) -> bool {
        match self.slot(player) {
            Some(i) if self.connected[i] => {
                self.connected[i] = false;
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.slot(player).is_some_and(|i| self.connected[i])
    }

    /// Returns `true` if `player` is one of the two participants,
    /// connected or not.
    pub fn is_participant(&self, player: PlayerId) -> bool {
        self.slot(player).is_some()
    }

    /// Returns `true` when both participants are connected.
    pub fn is_complete(&self) -> bool {
        self.connected.iter().all(|c| *c)
    }

    pub fn len(&self) -> usize {
        self.connected.iter().filter(|c| **c).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The connected participants, in roster order.
    pub fn iter(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.roster
            .iter()
            .zip(self.connected.iter())
            .filter_map(|(player, connected)| connected.then_some(*player))
    }

    pub fn roster(&self) -> [PlayerId; 2] {
        self.roster
    }

    fn slot(&self, player: PlayerId) -> Option<usize> {
        self.roster.iter().position(|p| *p == player)
    }
}
