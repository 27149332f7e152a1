//! Client session state and command interpretation for Parley.
//!
//! This crate holds the client's "brain":
//!
//! 1. **Session state**: what we know about our connection
//!    ([`Session`]), updated only by inbound frames via
//!    [`Session::apply`], which returns [`Effect`]s for the harness to
//!    carry out.
//! 2. **Command interpretation**: what a typed line means right now
//!    ([`interpret`]), producing an [`Action`].
//!
//! Nothing here does I/O. The harness in the `parley` crate owns the
//! connection and feeds frames and lines through these functions.
//!
//! # How it fits in the stack
//!
//! ```text
//! Harness (above)  ← runs the loop, sends frames, prints notices
//!     ↕
//! Session Layer (this crate)  ← state machine + interpreter
//!     ↕
//! Protocol Layer (below)  ← ServerMessage, ClientFrame, Room, User
//! ```

mod action;
mod command;
mod error;
mod session;

pub use action::{Action, Effect, Rejection};
pub use command::{COMMAND_PREFIX, interpret};
pub use error::SessionError;
pub use session::{Session, SessionPhase, USERNAME_PROMPT};
