//! The set of connections joined to one session.

use std::collections::HashMap;

use gambit_protocol::ServerEvent;
use gambit_transport::ConnectionId;
use tokio::sync::mpsc;

/// Outbound queue of one member. Unbounded so a broadcast never waits on a
/// slow peer; draining it is the connection task's job.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Members of a session and their private outbound queues.
#[derive(Debug, Default)]
pub struct SessionChannel {
    members: HashMap<ConnectionId, EventSender>,
}

impl SessionChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a member. Returns `false` (and keeps the existing queue) if the
    /// connection was already a member.
    pub fn join(&mut self, conn_id: ConnectionId, sender: EventSender) -> bool {
        if self.members.contains_key(&conn_id) {
            return false;
        }
        self.members.insert(conn_id, sender);
        true
    }

    /// Removes a member. Returns whether it was present.
    pub fn leave(&mut self, conn_id: ConnectionId) -> bool {
        self.members.remove(&conn_id).is_some()
    }

    pub fn contains(&self, conn_id: ConnectionId) -> bool {
        self.members.contains_key(&conn_id)
    }

    /// Queues `event` for every member. Members whose receiver is gone are
    /// skipped; their disconnect will remove them shortly.
    pub fn broadcast(&self, event: &ServerEvent) {
        for sender in self.members.values() {
            let _ = sender.send(event.clone());
        }
    }

    /// Queues `event` for one member, if present.
    pub fn unicast(&self, conn_id: ConnectionId, event: ServerEvent) {
        if let Some(sender) = self.members.get(&conn_id) {
            let _ = sender.send(event);
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
