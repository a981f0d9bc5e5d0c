//! The state of one chess session and the rules for changing it.
//!
//! [`Session`] is plain synchronous data. The actor in `actor.rs` owns one
//! and feeds it commands one at a time, which is what makes every operation
//! here atomic with respect to the session's other events.

use std::panic::{self, AssertUnwindSafe};

use gambit_protocol::{MoveRejection, NameRoster, Role, ServerEvent, SessionId};
use gambit_rules::{Color, MoveRequest, RuleEngine};
use gambit_transport::ConnectionId;
use tracing::{debug, info, warn};

use crate::channel::{EventSender, SessionChannel};
use crate::{MoveRefusal, SessionConfig};

/// A connection occupying a color.
#[derive(Debug, Clone)]
struct Seat {
    conn_id: ConnectionId,
    name: String,
}

/// A point-in-time summary of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub session_id: SessionId,
    pub member_count: usize,
    pub white: Option<String>,
    pub black: Option<String>,
    pub move_count: usize,
    pub side_to_move: Color,
}

/// What happened when a member left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Departure {
    /// The role the leaving connection held.
    pub role: Role,
    /// Whether the game was reset because a player left.
    pub reset: bool,
    /// Members still joined after the departure.
    pub remaining: usize,
}

/// One game: its engine, its two seats, its move log and its members.
pub struct Session<E> {
    id: SessionId,
    engine: E,
    white: Option<Seat>,
    black: Option<Seat>,
    history: Vec<String>,
    channel: SessionChannel,
    notify_rejections: bool,
}

impl<E: RuleEngine> Session<E> {
    /// Creates an empty session around a fresh `engine`.
    pub fn new(id: SessionId, engine: E, config: &SessionConfig) -> Self {
        Self {
            id,
            engine,
            white: None,
            black: None,
            history: Vec::new(),
            channel: SessionChannel::new(),
            notify_rejections: config.notify_rejections,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Adds a member and seats it in the first free color, if any.
    ///
    /// The joiner privately receives its role, the position and the move
    /// log; then every member receives the updated name roster.
    ///
    /// A member joining again goes through seating once more, which is how
    /// players left behind by a reset claim the freed colors. A member
    /// that already holds a seat keeps it and just gets the snapshot again.
    pub fn join(&mut self, conn_id: ConnectionId, name: String, sender: EventSender) -> Role {
        let rejoin = !self.channel.join(conn_id, sender);

        let role = match self.role_of(conn_id) {
            Role::Spectator => self.seat(conn_id, name),
            seated => seated,
        };

        info!(
            session_id = %self.id,
            %conn_id,
            %role,
            rejoin,
            members = self.channel.len(),
            "member joined"
        );

        self.channel.unicast(conn_id, ServerEvent::PlayerRole(role));
        self.channel.unicast(conn_id, ServerEvent::BoardState(self.engine.fen()));
        self.channel.unicast(conn_id, ServerEvent::MoveHistory(self.history.clone()));
        self.channel.broadcast(&ServerEvent::PlayerNames(self.roster()));
        role
    }

    fn seat(&mut self, conn_id: ConnectionId, name: String) -> Role {
        if self.white.is_none() {
            self.white = Some(Seat { conn_id, name });
            Role::White
        } else if self.black.is_none() {
            self.black = Some(Seat { conn_id, name });
            Role::Black
        } else {
            Role::Spectator
        }
    }

    /// Validates and applies a move proposed by `conn_id`.
    ///
    /// On success every member receives the new position followed by the
    /// full move log. On refusal nothing changes and nothing is broadcast;
    /// the proposer alone is told why if rejection notices are enabled.
    pub fn propose_move(
        &mut self,
        conn_id: ConnectionId,
        request: &MoveRequest,
    ) -> Result<(), MoveRefusal> {
        let result = self.try_move(conn_id, request);
        if let Err(refusal) = &result {
            debug!(
                session_id = %self.id,
                %conn_id,
                from = %request.from,
                to = %request.to,
                %refusal,
                "move dropped"
            );
            if self.notify_rejections && *refusal != MoveRefusal::NotMember {
                self.channel.unicast(
                    conn_id,
                    ServerEvent::MoveRejected(MoveRejection {
                        from: request.from,
                        to: request.to,
                        reason: refusal.to_string(),
                    }),
                );
            }
        }
        result
    }

    fn try_move(&mut self, conn_id: ConnectionId, request: &MoveRequest) -> Result<(), MoveRefusal> {
        if !self.channel.contains(conn_id) {
            return Err(MoveRefusal::NotMember);
        }
        let color = self.role_of(conn_id).color().ok_or(MoveRefusal::Spectator)?;
        let to_move = self.engine.side_to_move();
        if color != to_move {
            return Err(MoveRefusal::NotYourTurn(to_move));
        }

        // Work on a copy; the session's engine only changes on success.
        let mut scratch = self.engine.clone();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let applied = scratch.apply_move(request);
            (scratch, applied)
        }));
        let applied = match outcome {
            Ok((next, Ok(applied))) => {
                self.engine = next;
                applied
            }
            Ok((_, Err(violation))) => return Err(violation.into()),
            Err(_) => {
                warn!(session_id = %self.id, %conn_id, "rule engine panicked, move dropped");
                return Err(MoveRefusal::EngineFault);
            }
        };

        debug!(
            session_id = %self.id,
            %conn_id,
            san = %applied.san,
            moves = self.history.len() + 1,
            "move applied"
        );
        self.history.push(applied.san);
        self.channel.broadcast(&ServerEvent::BoardState(applied.fen));
        self.channel.broadcast(&ServerEvent::MoveHistory(self.history.clone()));
        Ok(())
    }

    /// Removes a member.
    ///
    /// If it held a seat the game is reset: both seats and names are
    /// cleared, the log emptied, the position restored, and the remaining
    /// members receive `gameReset`, the position, the empty log and the
    /// empty roster, in that order. Returns `None` if `conn_id` was not a
    /// member.
    pub fn leave(&mut self, conn_id: ConnectionId) -> Option<Departure> {
        let role = self.role_of(conn_id);
        if !self.channel.leave(conn_id) {
            return None;
        }

        let reset = role.is_player();
        if reset {
            self.reset();
        }

        info!(
            session_id = %self.id,
            %conn_id,
            %role,
            reset,
            members = self.channel.len(),
            "member left"
        );

        Some(Departure {
            role,
            reset,
            remaining: self.channel.len(),
        })
    }

    fn reset(&mut self) {
        self.engine.reset();
        self.white = None;
        self.black = None;
        self.history.clear();

        self.channel.broadcast(&ServerEvent::GameReset);
        self.channel.broadcast(&ServerEvent::BoardState(self.engine.fen()));
        self.channel.broadcast(&ServerEvent::MoveHistory(Vec::new()));
        self.channel.broadcast(&ServerEvent::PlayerNames(NameRoster::default()));
    }

    /// The role `conn_id` holds, derived from the seats. Non-members are
    /// spectators.
    pub fn role_of(&self, conn_id: ConnectionId) -> Role {
        let seated = |seat: &Option<Seat>| seat.as_ref().is_some_and(|s| s.conn_id == conn_id);
        if seated(&self.white) {
            Role::White
        } else if seated(&self.black) {
            Role::Black
        } else {
            Role::Spectator
        }
    }

    /// Names of the seated players.
    pub fn roster(&self) -> NameRoster {
        NameRoster {
            white: self.white.as_ref().map(|s| s.name.clone()),
            black: self.black.as_ref().map(|s| s.name.clone()),
        }
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn fen(&self) -> String {
        self.engine.fen()
    }

    pub fn member_count(&self) -> usize {
        self.channel.len()
    }

    pub fn info(&self) -> SessionInfo {
        let roster = self.roster();
        SessionInfo {
            session_id: self.id.clone(),
            member_count: self.channel.len(),
            white: roster.white,
            black: roster.black,
            move_count: self.history.len(),
            side_to_move: self.engine.side_to_move(),
        }
    }
}
