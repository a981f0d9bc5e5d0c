//! # Gambit
//!
//! Real-time two-player chess sessions over WebSockets.
//!
//! Clients join a named session; the first two become white and black and
//! everyone after that watches. The server validates every move against
//! the rules, keeps the authoritative position and move log, and broadcasts
//! each change to the whole session. When a player leaves, the game resets.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gambit::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), GambitError> {
//!     let server = GambitServer::builder()
//!         .bind("0.0.0.0:3000")
//!         .build::<Chess>()
//!         .await?;
//!     server.run().await
//! }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::ServerConfig;
pub use error::GambitError;
pub use server::{GambitServer, GambitServerBuilder};

/// Everything needed to run a server or talk to one.
pub mod prelude {
    pub use crate::{GambitError, GambitServer, GambitServerBuilder, ServerConfig};
    pub use gambit_protocol::{
        ClientEvent, Codec, JoinRequest, JsonCodec, MoveRejection, NameRoster, ProtocolError,
        Role, ServerEvent, SessionId,
    };
    pub use gambit_room::{SessionConfig, SessionError};
    pub use gambit_rules::{
        AppliedMove, Chess, Color, INITIAL_FEN, MoveRequest, PieceKind, RuleEngine,
        RuleViolation, Square,
    };
}
