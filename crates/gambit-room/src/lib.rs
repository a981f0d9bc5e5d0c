//! Chess sessions for Gambit.
//!
//! Each session runs as its own Tokio task (actor model) owning the rule
//! engine, the two seats, the move log and the set of joined connections.
//!
//! # Key types
//!
//! - [`SessionRegistry`]: creates sessions on first join, retires them when empty
//! - [`SessionHandle`]: send commands to a running session actor
//! - [`Session`]: the session state and its join / move / leave rules
//! - [`SessionChannel`]: members and their outbound queues
//! - [`SessionConfig`]: settings shared by all sessions

mod actor;
mod channel;
mod config;
mod error;
mod registry;
mod session;

pub use actor::SessionHandle;
pub use channel::{EventSender, SessionChannel};
pub use config::SessionConfig;
pub use error::{MoveRefusal, SessionError};
pub use registry::SessionRegistry;
pub use session::{Departure, Session, SessionInfo};
