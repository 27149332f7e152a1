//! What the client wants to do, and what the session wants to happen.
//!
//! Two small vocabularies connect the session layer to the harness:
//!
//! - [`Action`]: an intent produced from user input (or by the session
//!   itself, e.g. the automatic join after creating a room). Most actions
//!   become one outbound frame; [`Action::Disconnect`] and
//!   [`Action::Reject`] never touch the network.
//! - [`Effect`]: a side effect requested while applying an inbound
//!   frame: print something, prompt for input, or perform an action.

use parley_protocol::RoomId;

/// An outbound intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Answer the auth challenge with this username.
    RegisterUsername(String),
    /// Post `content` to the room we were in when the line was typed.
    SendChat { room_id: RoomId, content: String },
    FetchRooms,
    CreateRoom(String),
    JoinRoom(RoomId),
    LeaveRoom(RoomId),
    /// Close the connection and stop the client.
    Disconnect,
    /// The input was refused locally; nothing is sent.
    Reject(Rejection),
}

/// Why a line of user input didn't produce a network action.
///
/// The `Display` text is exactly what the user is shown.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("username cannot be empty")]
    EmptyUsername,

    /// Plain text typed while not in any room.
    #[error("unknown command")]
    UnknownCommand,

    #[error("room name cannot be empty")]
    EmptyRoomName,

    #[error("cannot join room \"{0}\"")]
    CannotJoin(String),

    #[error("no room joined")]
    NoRoomJoined,

    /// A `/command` this client doesn't know.
    #[error("unrecognized command")]
    UnrecognizedCommand,

    /// An empty line inside a room. Not an error, just nothing to send.
    #[error("")]
    BlankMessage,
}

impl Rejection {
    /// Silent rejections are dropped without telling the user.
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::BlankMessage)
    }
}

/// A side effect requested by [`Session::apply`](crate::Session::apply).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Show a line of text.
    Notify(String),
    /// Show a prompt and wait for input on the same line.
    Prompt(String),
    /// Perform an action as if the user had asked for it.
    Send(Action),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_messages() {
        assert_eq!(
            Rejection::EmptyUsername.to_string(),
            "username cannot be empty"
        );
        assert_eq!(
            Rejection::CannotJoin("Nowhere".into()).to_string(),
            "cannot join room \"Nowhere\""
        );
        assert!(Rejection::BlankMessage.is_silent());
        assert!(!Rejection::UnknownCommand.is_silent());
    }
}
