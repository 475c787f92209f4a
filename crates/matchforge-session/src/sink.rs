//! Outbound event delivery.
//!
//! The controller never knows who is listening. It hands each event to an
//! [`EventSink`], and the sink decides how it reaches clients.
//! [`ChannelSink`] is the stock implementation: one unbounded channel per
//! subscribed player, the same shape a connection handler drains into its
//! socket.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use matchforge_protocol::{OutboundEvent, PlayerId};
use tokio::sync::mpsc;

/// Receiving end of a [`ChannelSink`] subscription.
pub type EventReceiver = mpsc::UnboundedReceiver<OutboundEvent>;

/// Fan-out channel for one match's outbound events.
///
/// Fire-and-forget: `emit` must not block and cannot fail from the
/// controller's point of view. Delivery problems (a client that went
/// away) are the sink's business.
pub trait EventSink: Send + Sync + 'static {
    fn emit(&self, event: OutboundEvent);
}

impl<T: EventSink> EventSink for Arc<T> {
    fn emit(&self, event: OutboundEvent) {
        (**self).emit(event);
    }
}

// ---------------------------------------------------------------------------
// ChannelSink
// ---------------------------------------------------------------------------

/// An [`EventSink`] that copies every event to each subscribed player.
///
/// Cheap to clone: all clones share one subscriber table, so the match
/// actor can own one clone while connection handlers subscribe through
/// another.
#[derive(Clone, Default)]
pub struct ChannelSink {
    subscribers: Arc<Mutex<HashMap<PlayerId, mpsc::UnboundedSender<OutboundEvent>>>>,
}

impl ChannelSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes a player and returns their event stream.
    ///
    /// Subscribing again replaces the previous stream (a reconnecting
    /// client gets a fresh receiver; the old one sees its channel close).
    pub fn subscribe(&self, player: PlayerId) -> EventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().insert(player, tx);
        rx
    }

    /// Drops a player's stream. Returns `true` if they were subscribed.
    pub fn unsubscribe(&self, player: PlayerId) -> bool {
        self.lock().remove(&player).is_some()
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PlayerId, mpsc::UnboundedSender<OutboundEvent>>> {
        // A panic while holding this lock cannot leave the table half
        // written, so a poisoned lock is still usable.
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: OutboundEvent) {
        let mut subscribers = self.lock();
        subscribers.retain(|player, tx| {
            if tx.send(event.clone()).is_ok() {
                true
            } else {
                tracing::debug!(%player, "subscriber gone, pruning");
                false
            }
        });
    }
}

impl std::fmt::Debug for ChannelSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelSink")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
