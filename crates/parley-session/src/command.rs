//! The command interpreter: turns a typed line into an [`Action`].
//!
//! What a line means depends on where the session is:
//!
//! 1. Right after an auth challenge, the whole line is our username.
//! 2. A line without the `/` prefix is a chat message (if we're in a
//!    room) or a mistake (if we aren't).
//! 3. A `/` line is a command: `/fetch`, `/create <name>`,
//!    `/join <name>`, `/leave`, `/exit`.
//!
//! Interpretation never changes the session; it only reads it.

use crate::{Action, Rejection, Session};

/// Marks a line as a command rather than chat text.
pub const COMMAND_PREFIX: char = '/';

/// Interprets one line of user input against the current session.
///
/// # Example
///
/// ```rust
/// use parley_session::{interpret, Action, Rejection, Session};
///
/// let session = Session::new();
/// assert_eq!(interpret("/fetch", &session), Action::FetchRooms);
/// assert_eq!(
///     interpret("hello", &session),
///     Action::Reject(Rejection::UnknownCommand),
/// );
/// ```
pub fn interpret(line: &str, session: &Session) -> Action {
    if session.awaiting_username() {
        if line.trim().is_empty() {
            return Action::Reject(Rejection::EmptyUsername);
        }
        return Action::RegisterUsername(line.to_string());
    }

    let Some(command_line) = line.strip_prefix(COMMAND_PREFIX) else {
        return chat(line, session);
    };

    let (command, argument) = split_command(command_line);
    match command {
        "fetch" => Action::FetchRooms,
        "create" if argument.is_empty() => Action::Reject(Rejection::EmptyRoomName),
        "create" => Action::CreateRoom(argument.to_string()),
        "join" => join(argument, session),
        "leave" => match session.current_room() {
            Some(room) => Action::LeaveRoom(room.id.clone()),
            None => Action::Reject(Rejection::NoRoomJoined),
        },
        "exit" => Action::Disconnect,
        _ => Action::Reject(Rejection::UnrecognizedCommand),
    }
}

fn chat(line: &str, session: &Session) -> Action {
    let Some(room) = session.current_room() else {
        return Action::Reject(Rejection::UnknownCommand);
    };
    if line.trim().is_empty() {
        return Action::Reject(Rejection::BlankMessage);
    }
    Action::SendChat {
        room_id: room.id.clone(),
        content: line.to_string(),
    }
}

fn join(name: &str, session: &Session) -> Action {
    if name.is_empty() {
        return Action::Reject(Rejection::EmptyRoomName);
    }
    match session.find_room_by_name(name) {
        Some(room) => Action::JoinRoom(room.id.clone()),
        None => Action::Reject(Rejection::CannotJoin(name.to_string())),
    }
}

/// Splits `create My Room` into `("create", "My Room")`.
///
/// Only the first run of whitespace separates command from argument;
/// the argument keeps its inner spaces and loses the outer ones.
fn split_command(command_line: &str) -> (&str, &str) {
    let command_line = command_line.trim();
    match command_line.split_once(char::is_whitespace) {
        Some((command, argument)) => (command, argument.trim()),
        None => (command_line, ""),
    }
}
