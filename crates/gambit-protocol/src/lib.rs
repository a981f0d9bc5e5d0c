//! Wire protocol for Gambit.
//!
//! - **Events** ([`ClientEvent`], [`ServerEvent`] and their payloads): what
//!   clients and the server say to each other.
//! - **Codec** ([`Codec`], [`JsonCodec`]): how events become frames.
//! - **Errors** ([`ProtocolError`]): what can go wrong in between.
//!
//! The protocol layer knows nothing about connections or sessions; it only
//! shapes and checks messages.
//!
//! ```text
//! Transport (bytes) → Protocol (events) → Session (roles, engine)
//! ```

mod codec;
mod error;
mod events;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use events::{
    ClientEvent, JoinRequest, MoveRejection, NameRoster, Role, ServerEvent, SessionId,
};
