//! # Parley
//!
//! A terminal client for a WebSocket chat server.
//!
//! Parley keeps one connection open, reads lines from the user, and
//! reacts to frames from the server. Slash-commands manage rooms:
//!
//! | input | effect |
//! |---|---|
//! | `/fetch` | list open rooms |
//! | `/create <name>` | create a room (and join it) |
//! | `/join <name>` | join a room by name |
//! | `/leave` | leave the current room |
//! | `/exit` | disconnect |
//! | anything else | chat in the current room |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use parley::prelude::*;
//!
//! # async fn demo() -> Result<(), ClientError> {
//! let mut client = ChatClient::builder()
//!     .address(DEFAULT_ADDRESS)
//!     .connect(&WebSocketConnector)
//!     .await?;
//! let (output, _printer) = spawn_printer();
//! let input = spawn_stdin_reader(16).expect("input thread");
//! client.run(input, &output).await
//! # }
//! ```

mod client;
mod config;
pub mod console;
mod error;

pub use client::{ChatClient, ChatClientBuilder};
pub use config::{ClientConfig, DEFAULT_ADDRESS};
pub use console::Notification;
pub use error::ClientError;

/// Everything needed to build and run a client, in one import.
pub mod prelude {
    pub use crate::console::{Notification, spawn_printer, spawn_stdin_reader};
    pub use crate::{
        ChatClient, ChatClientBuilder, ClientConfig, ClientError,
        DEFAULT_ADDRESS,
    };
    pub use parley_protocol::{Codec, JsonCodec, ProtocolError};
    pub use parley_session::{
        Action, Effect, Rejection, Session, SessionError, SessionPhase,
        interpret,
    };
    pub use parley_transport::{
        Connection, Connector, MemoryConnection, MemoryConnector,
        TransportError, WebSocketConnection, WebSocketConnector,
    };
}
