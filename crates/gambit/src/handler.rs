//! Per-connection handler: event decoding, joins, move routing, cleanup.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The task multiplexes two sources:
//!   1. inbound frames from the client, decoded into `ClientEvent`s
//!   2. the connection's outbound queue, fed by its session actor
//!
//! When the task exits for any reason, the membership guard removes the
//! connection from its session.

use std::sync::Arc;

use gambit_protocol::{ClientEvent, Codec, JoinRequest, ServerEvent};
use gambit_room::{EventSender, SessionError, SessionHandle};
use gambit_rules::{MoveRequest, RuleEngine};
use gambit_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::GambitError;
use crate::server::ServerState;

/// Drop guard that takes a connection out of its session when the handler
/// exits.
///
/// `Drop` is synchronous, so the departure runs in a spawned task that
/// waits for the registry lock.
struct MembershipGuard<E: RuleEngine + Default, C: Codec> {
    handle: SessionHandle,
    conn_id: ConnectionId,
    state: Arc<ServerState<E, C>>,
}

impl<E: RuleEngine + Default, C: Codec> Drop for MembershipGuard<E, C> {
    fn drop(&mut self) {
        let session_id = self.handle.session_id().clone();
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut sessions = state.sessions.lock().await;
            if let Err(e) = sessions.leave(&session_id, conn_id).await {
                tracing::debug!(%session_id, %conn_id, error = %e, "leave failed");
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<E, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<E, C>>,
) -> Result<(), GambitError>
where
    E: RuleEngine + Default,
    C: Codec,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<ServerEvent>();
    let mut membership: Option<MembershipGuard<E, C>> = None;

    let result = run_loop(&conn, &state, &outbound_tx, &mut outbound_rx, &mut membership).await;

    // Leave before closing so the remaining members hear about it promptly.
    drop(membership);
    let _ = conn.close().await;
    result
}

async fn run_loop<E, C>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<E, C>>,
    outbound_tx: &EventSender,
    outbound_rx: &mut mpsc::UnboundedReceiver<ServerEvent>,
    membership: &mut Option<MembershipGuard<E, C>>,
) -> Result<(), GambitError>
where
    E: RuleEngine + Default,
    C: Codec,
{
    let conn_id = conn.id();
    let mut deadline = state.idle_timeout.map(|idle| Instant::now() + idle);

    loop {
        tokio::select! {
            inbound = recv_until(conn, deadline) => {
                let data = match inbound {
                    Inbound::Frame(data) => data,
                    Inbound::Closed => {
                        tracing::info!(%conn_id, "connection closed");
                        return Ok(());
                    }
                    Inbound::Idle => {
                        tracing::info!(%conn_id, "connection idle, closing");
                        return Ok(());
                    }
                    Inbound::Failed(e) => {
                        tracing::debug!(%conn_id, error = %e, "recv error");
                        return Err(e.into());
                    }
                };
                if let Some(idle) = state.idle_timeout {
                    deadline = Some(Instant::now() + idle);
                }
                handle_frame(conn_id, state, outbound_tx, membership, &data).await;
            }
            Some(event) = outbound_rx.recv() => {
                let bytes = state.codec.encode(&event)?;
                conn.send(&bytes).await?;
                tracing::trace!(%conn_id, event = event.name(), "event sent");
            }
        }
    }
}

enum Inbound {
    Frame(Vec<u8>),
    Closed,
    Idle,
    Failed(gambit_transport::TransportError),
}

/// Waits for the next frame, giving up at `deadline` if one is set.
async fn recv_until(conn: &WebSocketConnection, deadline: Option<Instant>) -> Inbound {
    let received = match deadline {
        Some(at) => match tokio::time::timeout_at(at, conn.recv()).await {
            Ok(received) => received,
            Err(_) => return Inbound::Idle,
        },
        None => conn.recv().await,
    };
    match received {
        Ok(Some(data)) => Inbound::Frame(data),
        Ok(None) => Inbound::Closed,
        Err(e) => Inbound::Failed(e),
    }
}

/// Decodes one inbound frame and dispatches it. Bad input is dropped.
async fn handle_frame<E, C>(
    conn_id: ConnectionId,
    state: &Arc<ServerState<E, C>>,
    outbound_tx: &EventSender,
    membership: &mut Option<MembershipGuard<E, C>>,
    data: &[u8],
) where
    E: RuleEngine + Default,
    C: Codec,
{
    let event: ClientEvent = match state.codec.decode(data) {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!(%conn_id, error = %e, "dropping undecodable frame");
            return;
        }
    };

    match event {
        ClientEvent::JoinRoom(request) => match membership.as_ref() {
            Some(joined) => rejoin(conn_id, &joined.handle, outbound_tx, request).await,
            None => {
                if let Some(guard) = join(conn_id, state, outbound_tx, request).await {
                    *membership = Some(guard);
                }
            }
        },
        ClientEvent::Move(request) => match membership.as_ref() {
            Some(joined) => propose(conn_id, &joined.handle, request).await,
            None => tracing::debug!(%conn_id, "move before join, ignoring"),
        },
    }
}

async fn join<E, C>(
    conn_id: ConnectionId,
    state: &Arc<ServerState<E, C>>,
    outbound_tx: &EventSender,
    request: JoinRequest,
) -> Option<MembershipGuard<E, C>>
where
    E: RuleEngine + Default,
    C: Codec,
{
    let (session_id, name) = match request.normalized() {
        Ok(fields) => fields,
        Err(e) => {
            tracing::debug!(%conn_id, error = %e, "dropping join");
            return None;
        }
    };

    let joined = {
        let mut sessions = state.sessions.lock().await;
        sessions
            .join(&session_id, conn_id, name, outbound_tx.clone())
            .await
    };

    match joined {
        Ok((handle, role)) => {
            tracing::debug!(%conn_id, %session_id, %role, "joined session");
            Some(MembershipGuard {
                handle,
                conn_id,
                state: Arc::clone(state),
            })
        }
        Err(e) => {
            tracing::warn!(%conn_id, %session_id, error = %e, "join failed");
            None
        }
    }
}

/// A join from a connection that is already a member. Only the session it
/// first joined is accepted; seating runs again there so seats freed by a
/// reset can be claimed.
async fn rejoin(
    conn_id: ConnectionId,
    handle: &SessionHandle,
    outbound_tx: &EventSender,
    request: JoinRequest,
) {
    let (session_id, name) = match request.normalized() {
        Ok(fields) => fields,
        Err(e) => {
            tracing::debug!(%conn_id, error = %e, "dropping join");
            return;
        }
    };
    if &session_id != handle.session_id() {
        tracing::debug!(
            %conn_id,
            joined = %handle.session_id(),
            requested = %session_id,
            "already in another session, ignoring join"
        );
        return;
    }

    match handle.join(conn_id, name, outbound_tx.clone()).await {
        Ok(role) => tracing::debug!(%conn_id, %session_id, %role, "rejoined session"),
        Err(e) => tracing::warn!(%conn_id, %session_id, error = %e, "rejoin failed"),
    }
}

async fn propose(conn_id: ConnectionId, handle: &SessionHandle, request: MoveRequest) {
    match handle.propose_move(conn_id, request).await {
        Ok(()) => {}
        Err(SessionError::Refused(_)) => {
            // Already logged by the session with the reason.
        }
        Err(e) => {
            tracing::debug!(%conn_id, session_id = %handle.session_id(), error = %e, "move not delivered");
        }
    }
}
