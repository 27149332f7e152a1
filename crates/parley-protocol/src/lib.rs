//! Wire protocol for the Parley chat client.
//!
//! This crate defines the "language" the client and the chat server
//! speak:
//!
//! - **Types** ([`ClientFrame`], [`ClientMessage`], [`ServerMessage`],
//!   [`Room`], [`User`], ...): the frames that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how frames are
//!   converted to/from bytes, plus [`decode_server_message`] which
//!   tolerates frame kinds this client doesn't know yet.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw frames) and session
//! (client state). It doesn't know about connections or rooms joined;
//! it only knows how to serialize and deserialize frames.
//!
//! ```text
//! Transport (bytes) → Protocol (ServerMessage) → Session (state + effects)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, decode_server_message};
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientFrame, ClientMessage, FrameKind, Room, RoomId, ServerMessage,
    SessionId, User,
};

/// Re-exported so downstream crates name timestamps the same way.
pub use chrono::NaiveDateTime;
