//! Events that travel on the wire.
//!
//! Every frame is one JSON object with an `event` name and, for events that
//! carry something, a `data` field:
//!
//! ```text
//! {"event":"joinRoom","data":{"roomId":"r1","playerName":"Ann"}}
//! {"event":"move","data":{"from":"e2","to":"e4","promotion":"q"}}
//! {"event":"playerRole","data":"w"}
//! {"event":"gameReset"}
//! ```

use std::fmt;

use gambit_rules::{Color, MoveRequest, Square};
use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Client-chosen name of a session. Any non-blank string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// What a member may do in a session.
///
/// Serialized the way clients compare it: `"w"`, `"b"`, `"spectator"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "w")]
    White,
    #[serde(rename = "b")]
    Black,
    #[serde(rename = "spectator")]
    Spectator,
}

impl Role {
    /// The side this role plays, or `None` for spectators.
    pub fn color(self) -> Option<Color> {
        match self {
            Self::White => Some(Color::White),
            Self::Black => Some(Color::Black),
            Self::Spectator => None,
        }
    }

    pub fn is_player(self) -> bool {
        self.color().is_some()
    }
}

impl From<Color> for Role {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Self::White,
            Color::Black => Self::Black,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::White => f.write_str("white"),
            Self::Black => f.write_str("black"),
            Self::Spectator => f.write_str("spectator"),
        }
    }
}

/// Display names of the seated players; `null` for an empty seat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRoster {
    pub white: Option<String>,
    pub black: Option<String>,
}

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// Payload of a `joinRoom` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub room_id: String,
    pub player_name: String,
}

impl JoinRequest {
    pub fn new(room_id: impl Into<String>, player_name: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            player_name: player_name.into(),
        }
    }

    /// Trims both fields and checks neither is blank.
    ///
    /// # Errors
    /// `ProtocolError::InvalidMessage` naming the blank field.
    pub fn normalized(self) -> Result<(SessionId, String), ProtocolError> {
        let room_id = self.room_id.trim();
        if room_id.is_empty() {
            return Err(ProtocolError::InvalidMessage("roomId is blank".into()));
        }
        let player_name = self.player_name.trim();
        if player_name.is_empty() {
            return Err(ProtocolError::InvalidMessage("playerName is blank".into()));
        }
        Ok((SessionId::new(room_id), player_name.to_string()))
    }
}

/// Everything a client may send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "joinRoom")]
    JoinRoom(JoinRequest),
    #[serde(rename = "move")]
    Move(MoveRequest),
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// Why a move proposal was dropped; sent only to the proposer, and only
/// when the session is configured to explain rejections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRejection {
    pub from: Square,
    pub to: Square,
    pub reason: String,
}

/// Everything the server may send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// The receiver's role, sent once after joining.
    PlayerRole(Role),
    /// Current position as FEN.
    BoardState(String),
    /// Every applied move so far, in SAN, oldest first.
    MoveHistory(Vec<String>),
    PlayerNames(NameRoster),
    /// A player left; the game starts over.
    GameReset,
    MoveRejected(MoveRejection),
}

impl ServerEvent {
    /// Event name as it appears on the wire, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PlayerRole(_) => "playerRole",
            Self::BoardState(_) => "boardState",
            Self::MoveHistory(_) => "moveHistory",
            Self::PlayerNames(_) => "playerNames",
            Self::GameReset => "gameReset",
            Self::MoveRejected(_) => "moveRejected",
        }
    }
}
