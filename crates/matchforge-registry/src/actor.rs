//! Match actor: an isolated Tokio task that owns one session controller.
//!
//! The actor is the serialization point the controller relies on. It
//! processes one command at a time and, between commands, waits on the
//! controller's ready-check heartbeat.

use matchforge_protocol::{MatchId, PlayerId, SessionState};
use matchforge_session::{ChannelSink, EventReceiver, SessionController, SessionError};
use matchforge_store::MatchStore;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::RegistryError;

type Reply<T> = oneshot::Sender<T>;

/// Commands sent to a match actor through its channel.
pub(crate) enum MatchCommand {
    Connect {
        player: PlayerId,
        reply: Reply<Result<(), SessionError>>,
    },
    Disconnect {
        player: PlayerId,
        reply: Reply<Result<(), SessionError>>,
    },
    SetReady {
        player: PlayerId,
        reply: Reply<Result<(), SessionError>>,
    },
    /// Request the last committed state.
    State { reply: Reply<SessionState> },
    /// Stop the actor. The reply fires after the heartbeat is cancelled.
    Shutdown { reply: Reply<()> },
}

/// Handle to a running match actor.
///
/// Cheap to clone: an `mpsc::Sender` plus the match's shared
/// [`ChannelSink`]. The [`MatchRegistry`](crate::MatchRegistry) holds one
/// per open match; connection handlers can hold their own clones.
#[derive(Clone)]
pub struct MatchHandle {
    match_id: MatchId,
    sender: mpsc::Sender<MatchCommand>,
    sink: ChannelSink,
}

impl MatchHandle {
    pub fn match_id(&self) -> &MatchId {
        &self.match_id
    }

    /// Routes a participant's connection to the controller.
    pub async fn connect(&self, player: PlayerId) -> Result<(), RegistryError> {
        self.request(|reply| MatchCommand::Connect { player, reply })
            .await?
            .map_err(Into::into)
    }

    /// Routes a participant's disconnection to the controller.
    pub async fn disconnect(&self, player: PlayerId) -> Result<(), RegistryError> {
        self.request(|reply| MatchCommand::Disconnect { player, reply })
            .await?
            .map_err(Into::into)
    }

    /// Routes a participant's ready confirmation to the controller.
    pub async fn set_ready(&self, player: PlayerId) -> Result<(), RegistryError> {
        self.request(|reply| MatchCommand::SetReady { player, reply })
            .await?
            .map_err(Into::into)
    }

    /// The match's last committed state.
    pub async fn state(&self) -> Result<SessionState, RegistryError> {
        self.request(|reply| MatchCommand::State { reply }).await
    }

    /// Stops the actor and waits until its heartbeat is cancelled.
    pub async fn shutdown(&self) -> Result<(), RegistryError> {
        self.request(|reply| MatchCommand::Shutdown { reply }).await
    }

    /// Subscribes to this match's outbound events.
    ///
    /// Subscribe before routing the player's connect so the resulting
    /// `state-sync` is not missed.
    pub fn subscribe(&self, player: PlayerId) -> EventReceiver {
        self.sink.subscribe(player)
    }

    pub fn unsubscribe(&self, player: PlayerId) -> bool {
        self.sink.unsubscribe(player)
    }

    /// Returns `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Returns `true` if both handles drive the same actor.
    pub fn same_match(&self, other: &MatchHandle) -> bool {
        self.sender.same_channel(&other.sender)
    }

    /// Sends a command and waits for its reply.
    async fn request<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> MatchCommand,
    ) -> Result<T, RegistryError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| RegistryError::Unavailable(self.match_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RegistryError::Unavailable(self.match_id.clone()))
    }
}

impl std::fmt::Debug for MatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchHandle")
            .field("match_id", &self.match_id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// The internal actor state. Runs inside a Tokio task.
struct MatchActor<S: MatchStore> {
    controller: SessionController<S, ChannelSink>,
    receiver: mpsc::Receiver<MatchCommand>,
}

impl<S: MatchStore> MatchActor<S> {
    /// Runs the actor loop until shutdown or until every handle is gone.
    async fn run(mut self) {
        let match_id = self.controller.match_id().clone();
        info!(%match_id, "match actor started");

        let mut ack = None;
        loop {
            tokio::select! {
                // Commands first, so a start that lands on the same instant
                // as a beat cancels the beat.
                biased;

                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    match cmd {
                        MatchCommand::Connect { player, reply } => {
                            let _ = reply.send(self.controller.on_connect(player).await);
                        }
                        MatchCommand::Disconnect { player, reply } => {
                            let _ = reply.send(self.controller.on_disconnect(player).await);
                        }
                        MatchCommand::SetReady { player, reply } => {
                            let _ = reply.send(self.controller.set_ready(player).await);
                        }
                        MatchCommand::State { reply } => {
                            let _ = reply.send(self.controller.state().clone());
                        }
                        MatchCommand::Shutdown { reply } => {
                            ack = Some(reply);
                            break;
                        }
                    }
                }
                seq = self.controller.ready_check() => {
                    debug!(%match_id, seq, "ready-check sent");
                }
            }
        }

        self.controller.shutdown();
        if let Some(ack) = ack {
            let _ = ack.send(());
        }
        info!(%match_id, "match actor stopped");
    }
}

/// Spawns the actor for an opened controller and returns its handle.
///
/// `sink` must be the sink the controller emits into, so that handle
/// subscriptions see the controller's events.
pub(crate) fn spawn_match<S: MatchStore>(
    controller: SessionController<S, ChannelSink>,
    sink: ChannelSink,
    channel_size: usize,
) -> MatchHandle {
    let (tx, rx) = mpsc::channel(channel_size);
    let match_id = controller.match_id().clone();

    let actor = MatchActor {
        controller,
        receiver: rx,
    };
    tokio::spawn(actor.run());

    MatchHandle {
        match_id,
        sender: tx,
        sink,
    }
}
