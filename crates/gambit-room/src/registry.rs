//! Session registry: creates, tracks and retires sessions by id.

use std::collections::HashMap;
use std::marker::PhantomData;

use gambit_protocol::{Role, SessionId};
use gambit_rules::RuleEngine;
use gambit_transport::ConnectionId;

use crate::actor::spawn_session;
use crate::channel::EventSender;
use crate::session::Departure;
use crate::{SessionConfig, SessionError, SessionHandle};

/// Every live session, keyed by id.
///
/// A session exists from the first join to its id until its last member
/// leaves. The server keeps the registry behind one async mutex and only
/// locks it for [`join`](Self::join) and [`leave`](Self::leave), so a join
/// can never land in a session that is being retired.
pub struct SessionRegistry<E> {
    sessions: HashMap<SessionId, SessionHandle>,
    config: SessionConfig,
    _engine: PhantomData<fn() -> E>,
}

impl<E: RuleEngine + Default> SessionRegistry<E> {
    /// Creates an empty registry whose sessions use `config`.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            config,
            _engine: PhantomData,
        }
    }

    /// Returns the session for `session_id`, starting a fresh one if none
    /// exists.
    pub fn resolve_or_create(&mut self, session_id: &SessionId) -> SessionHandle {
        if let Some(handle) = self.sessions.get(session_id) {
            if !handle.is_closed() {
                return handle.clone();
            }
            tracing::warn!(%session_id, "session actor gone, replacing");
        }

        let handle = spawn_session(session_id.clone(), E::default(), &self.config);
        self.sessions.insert(session_id.clone(), handle.clone());
        tracing::info!(%session_id, sessions = self.sessions.len(), "session created");
        handle
    }

    /// Drops the entry for `session_id` and stops its actor.
    pub async fn remove(&mut self, session_id: &SessionId) -> Option<SessionHandle> {
        let handle = self.sessions.remove(session_id)?;
        if let Err(e) = handle.shutdown().await {
            tracing::debug!(%session_id, error = %e, "session actor already stopped");
        }
        tracing::info!(%session_id, sessions = self.sessions.len(), "session removed");
        Some(handle)
    }

    /// Resolves (or creates) the session and joins `conn_id` to it.
    ///
    /// Returns the handle the connection should keep for move proposals,
    /// and the role it was given.
    pub async fn join(
        &mut self,
        session_id: &SessionId,
        conn_id: ConnectionId,
        name: String,
        sender: EventSender,
    ) -> Result<(SessionHandle, Role), SessionError> {
        let handle = self.resolve_or_create(session_id);
        let role = handle.join(conn_id, name, sender).await?;
        Ok((handle, role))
    }

    /// Removes `conn_id` from its session and retires the session if that
    /// was the last member.
    ///
    /// Returns `Ok(None)` if the session does not exist or the connection
    /// was not a member.
    pub async fn leave(
        &mut self,
        session_id: &SessionId,
        conn_id: ConnectionId,
    ) -> Result<Option<Departure>, SessionError> {
        let Some(handle) = self.sessions.get(session_id).cloned() else {
            return Ok(None);
        };

        let departure = match handle.leave(conn_id).await {
            Ok(departure) => departure,
            Err(e) => {
                // The actor is gone; nothing can be joined to it any more.
                self.sessions.remove(session_id);
                return Err(e);
            }
        };

        if departure.is_some_and(|d| d.remaining == 0) {
            self.remove(session_id).await;
        }
        Ok(departure)
    }

    /// The handle for `session_id`, if the session exists.
    pub fn get(&self, session_id: &SessionId) -> Option<SessionHandle> {
        self.sessions.get(session_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.keys().cloned().collect()
    }
}

impl<E: RuleEngine + Default> Default for SessionRegistry<E> {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
