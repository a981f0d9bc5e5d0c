//! Session actor: a Tokio task that owns one [`Session`].
//!
//! Everything that touches a session goes through its command queue, so
//! commands for one session run strictly one after another while different
//! sessions run in parallel.

use gambit_protocol::{Role, SessionId};
use gambit_rules::{MoveRequest, RuleEngine};
use gambit_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};

use crate::channel::EventSender;
use crate::session::{Departure, Session, SessionInfo};
use crate::{MoveRefusal, SessionConfig, SessionError};

/// Commands sent to a session actor.
///
/// Each carries a reply channel; the caller awaits the outcome so that,
/// once a call returns, its broadcasts are already queued.
pub(crate) enum SessionCommand {
    Join {
        conn_id: ConnectionId,
        name: String,
        sender: EventSender,
        reply: oneshot::Sender<Role>,
    },
    Move {
        conn_id: ConnectionId,
        request: MoveRequest,
        reply: oneshot::Sender<Result<(), MoveRefusal>>,
    },
    Leave {
        conn_id: ConnectionId,
        reply: oneshot::Sender<Option<Departure>>,
    },
    Info {
        reply: oneshot::Sender<SessionInfo>,
    },
    Shutdown,
}

/// Handle to a running session actor.
///
/// Cheap to clone. The registry keeps one per session and every joined
/// connection caches its own copy for move proposals.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    session_id: SessionId,
    sender: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Whether the actor behind this handle has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Joins `conn_id` under `name`; outbound events go to `sender`.
    pub async fn join(
        &self,
        conn_id: ConnectionId,
        name: String,
        sender: EventSender,
    ) -> Result<Role, SessionError> {
        self.request(|reply| SessionCommand::Join {
            conn_id,
            name,
            sender,
            reply,
        })
        .await
    }

    /// Proposes a move on behalf of `conn_id`.
    ///
    /// # Errors
    /// `SessionError::Refused` when the move was dropped, or
    /// `SessionError::Unavailable` if the session has shut down.
    pub async fn propose_move(
        &self,
        conn_id: ConnectionId,
        request: MoveRequest,
    ) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::Move {
            conn_id,
            request,
            reply,
        })
        .await??;
        Ok(())
    }

    /// Removes `conn_id` from the session.
    pub async fn leave(&self, conn_id: ConnectionId) -> Result<Option<Departure>, SessionError> {
        self.request(|reply| SessionCommand::Leave { conn_id, reply })
            .await
    }

    /// Returns a snapshot of the session.
    pub async fn info(&self) -> Result<SessionInfo, SessionError> {
        self.request(|reply| SessionCommand::Info { reply }).await
    }

    /// Stops the actor after it finishes the commands already queued.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.sender
            .send(SessionCommand::Shutdown)
            .await
            .map_err(|_| self.unavailable())
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> SessionError {
        SessionError::Unavailable(self.session_id.clone())
    }
}

struct SessionActor<E> {
    session: Session<E>,
    receiver: mpsc::Receiver<SessionCommand>,
}

impl<E: RuleEngine> SessionActor<E> {
    /// Processes commands until shutdown or until every handle is dropped.
    async fn run(mut self) {
        tracing::debug!(session_id = %self.session.id(), "session actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                SessionCommand::Join {
                    conn_id,
                    name,
                    sender,
                    reply,
                } => {
                    let _ = reply.send(self.session.join(conn_id, name, sender));
                }
                SessionCommand::Move {
                    conn_id,
                    request,
                    reply,
                } => {
                    let _ = reply.send(self.session.propose_move(conn_id, &request));
                }
                SessionCommand::Leave { conn_id, reply } => {
                    let _ = reply.send(self.session.leave(conn_id));
                }
                SessionCommand::Info { reply } => {
                    let _ = reply.send(self.session.info());
                }
                SessionCommand::Shutdown => break,
            }
        }

        tracing::debug!(session_id = %self.session.id(), "session actor stopped");
    }
}

/// Spawns an actor owning a fresh session and returns its handle.
pub(crate) fn spawn_session<E: RuleEngine>(
    session_id: SessionId,
    engine: E,
    config: &SessionConfig,
) -> SessionHandle {
    let (tx, rx) = mpsc::channel(config.channel_size.max(1));
    let actor = SessionActor {
        session: Session::new(session_id.clone(), engine, config),
        receiver: rx,
    };
    tokio::spawn(actor.run());

    SessionHandle {
        session_id,
        sender: tx,
    }
}
