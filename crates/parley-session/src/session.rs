//! The client-side session: everything we know about our connection.
//!
//! A [`Session`] starts empty and is filled in as frames arrive from the
//! server. It is never mutated directly by user input; typed commands
//! become [`Action`]s, get sent, and the server's answer is what changes
//! the state. The client is only in a room once the server says so.
//!
//! ```text
//!   Unregistered ──AuthChallenge──→ AwaitingUsername
//!                                        │
//!                                  AuthAccepted
//!                                        ▼
//!                      Authenticated { room: None }
//!                          │                  ▲
//!                      RoomJoined        RoomLeft (us)
//!                          ▼                  │
//!                      Authenticated { room: Some(id) }
//! ```

use parley_protocol::{
    ClientFrame, ClientMessage, FrameKind, NaiveDateTime, Room, RoomId,
    ServerMessage, SessionId, User,
};

use crate::{Action, Effect, SessionError};

/// Shown when the server wants a username.
pub const USERNAME_PROMPT: &str = "Input your name>> ";

// ---------------------------------------------------------------------------
// SessionPhase
// ---------------------------------------------------------------------------

/// A coarse view of where the session is in its lifecycle.
///
/// Derived from the session's fields on demand, never stored, so it
/// can't drift out of sync with them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    /// No contact with the server yet.
    Unregistered,
    /// We have a session id; the server is waiting for a username.
    AwaitingUsername,
    /// Logged in, optionally inside a room.
    Authenticated { room: Option<RoomId> },
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The client's record of authentication and room membership.
#[derive(Debug, Clone, Default)]
pub struct Session {
    authenticated: bool,
    session_id: Option<SessionId>,
    username: Option<String>,
    joined_time: Option<NaiveDateTime>,
    /// Kind of the most recently applied frame.
    status: Option<FrameKind>,
    /// Known rooms. Server order from the last listing, with rooms we
    /// created since then at the front.
    rooms: Vec<Room>,
    /// Not necessarily an element of `rooms`.
    current_room: Option<Room>,
}

impl Session {
    /// Creates an empty session for a fresh connection.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn joined_time(&self) -> Option<NaiveDateTime> {
        self.joined_time
    }

    pub fn status(&self) -> Option<&FrameKind> {
        self.status.as_ref()
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn current_room(&self) -> Option<&Room> {
        self.current_room.as_ref()
    }

    pub fn phase(&self) -> SessionPhase {
        if self.authenticated {
            SessionPhase::Authenticated {
                room: self.current_room.as_ref().map(|r| r.id.clone()),
            }
        } else if self.session_id.is_some() {
            SessionPhase::AwaitingUsername
        } else {
            SessionPhase::Unregistered
        }
    }

    /// Returns `true` when the next line of input should be taken as our
    /// username: the last frame was an auth challenge and we aren't
    /// logged in yet.
    pub fn awaiting_username(&self) -> bool {
        !self.authenticated && self.status == Some(FrameKind::AuthChallenge)
    }

    /// Finds the first known room with exactly this name.
    pub fn find_room_by_name(&self, name: &str) -> Option<&Room> {
        self.rooms.iter().find(|room| room.name == name)
    }

    fn is_own(&self, user: &User) -> bool {
        self.session_id.as_ref() == Some(&user.session_id)
    }

    // -----------------------------------------------------------------
    // Inbound dispatch
    // -----------------------------------------------------------------

    /// Applies one inbound frame and returns the effects it calls for.
    ///
    /// `status` is updated first, for every frame, including unknown
    /// kinds and frames that turn out to be protocol violations.
    ///
    /// # Errors
    /// Returns [`SessionError::ProtocolViolation`] when the frame
    /// contradicts the session. The session is left unchanged apart from
    /// `status`.
    pub fn apply(
        &mut self,
        frame: ServerMessage,
    ) -> Result<Vec<Effect>, SessionError> {
        self.status = Some(frame.kind());

        match frame {
            ServerMessage::AuthChallenge { session_id } => {
                self.on_auth_challenge(session_id)
            }
            ServerMessage::AuthAccepted {
                joined_time,
                username,
            } => Ok(self.on_auth_accepted(joined_time, username)),
            ServerMessage::RoomList { rooms } => Ok(self.on_room_list(rooms)),
            ServerMessage::RoomCreated { room_id, name } => {
                Ok(self.on_room_created(room_id, name))
            }
            ServerMessage::RoomJoined { room_id, user } => {
                self.on_room_joined(room_id, user)
            }
            ServerMessage::RoomLeft { user, .. } => Ok(self.on_room_left(user)),
            ServerMessage::ChatReceived {
                timestamp,
                user,
                content,
            } => Ok(vec![Effect::Notify(format!(
                "{}<{timestamp}>: {content}",
                user.name
            ))]),
            ServerMessage::ServerError { message } => {
                tracing::warn!(%message, "server reported an error");
                Ok(vec![Effect::Notify(format!("server error: {message}"))])
            }
            ServerMessage::Unknown { kind } => {
                tracing::debug!(%kind, "ignoring frame of unknown kind");
                Ok(Vec::new())
            }
        }
    }

    fn on_auth_challenge(
        &mut self,
        session_id: SessionId,
    ) -> Result<Vec<Effect>, SessionError> {
        if self.authenticated {
            tracing::debug!("auth challenge while authenticated, ignoring");
            return Ok(Vec::new());
        }
        match &self.session_id {
            Some(existing) if *existing != session_id => {
                return Err(SessionError::ProtocolViolation(format!(
                    "server tried to change session id from {existing} to {session_id}"
                )));
            }
            Some(_) => {}
            None => {
                tracing::info!(%session_id, "session id assigned");
                self.session_id = Some(session_id);
            }
        }
        Ok(vec![Effect::Prompt(USERNAME_PROMPT.to_string())])
    }

    fn on_auth_accepted(
        &mut self,
        joined_time: NaiveDateTime,
        username: Option<String>,
    ) -> Vec<Effect> {
        if self.authenticated {
            tracing::debug!("duplicate auth acceptance, ignoring");
            return Vec::new();
        }
        self.authenticated = true;
        self.joined_time = Some(joined_time);
        if username.is_some() {
            self.username = username;
        }
        tracing::info!(username = ?self.username, %joined_time, "authenticated");
        vec![Effect::Send(Action::FetchRooms)]
    }

    fn on_room_list(&mut self, rooms: Vec<Room>) -> Vec<Effect> {
        self.rooms = rooms;
        if self.rooms.is_empty() {
            return vec![Effect::Notify(
                "No room is open. Create a new room and join it.".to_string(),
            )];
        }
        let mut effects = Vec::with_capacity(self.rooms.len() + 1);
        effects.push(Effect::Notify("Here's rooms open:".to_string()));
        effects.extend(
            self.rooms
                .iter()
                .enumerate()
                .map(|(i, room)| Effect::Notify(format!("{}. {}", i + 1, room.name))),
        );
        effects
    }

    fn on_room_created(&mut self, room_id: RoomId, name: String) -> Vec<Effect> {
        // Drop a stale entry with the same id so the list stays unique.
        self.rooms.retain(|room| room.id != room_id);
        self.rooms.insert(0, Room::new(room_id.clone(), name));
        tracing::debug!(%room_id, "room created, joining");
        vec![Effect::Send(Action::JoinRoom(room_id))]
    }

    fn on_room_joined(
        &mut self,
        room_id: RoomId,
        user: User,
    ) -> Result<Vec<Effect>, SessionError> {
        let room = self
            .rooms
            .iter()
            .find(|room| room.id == room_id)
            .cloned()
            .ok_or_else(|| {
                SessionError::ProtocolViolation(format!(
                    "join confirmation for unknown room {room_id}"
                ))
            })?;
        let notice = format!("\"{}\" has joined \"{}\"", user.name, room.name);
        self.current_room = Some(room);
        Ok(vec![Effect::Notify(notice)])
    }

    fn on_room_left(&mut self, user: User) -> Vec<Effect> {
        if self.is_own(&user) {
            self.current_room = None;
            vec![Effect::Notify("You have left the room.".to_string())]
        } else {
            vec![Effect::Notify(format!("\"{}\" has left the room.", user.name))]
        }
    }

    // -----------------------------------------------------------------
    // Outbound framing
    // -----------------------------------------------------------------

    /// Builds the wire frame for `action`, stamped with our session id.
    ///
    /// Returns `None` for actions that never leave the client
    /// ([`Action::Disconnect`], [`Action::Reject`]).
    pub fn to_wire(&self, action: &Action) -> Option<ClientFrame> {
        let message = match action {
            Action::RegisterUsername(username) => ClientMessage::RegisterUsername {
                username: username.clone(),
            },
            Action::SendChat { room_id, content } => ClientMessage::SendChat {
                room_id: room_id.clone(),
                content: content.clone(),
            },
            Action::FetchRooms => ClientMessage::FetchRooms,
            Action::CreateRoom(name) => ClientMessage::CreateRoom { name: name.clone() },
            Action::JoinRoom(room_id) => ClientMessage::JoinRoom {
                room_id: room_id.clone(),
            },
            Action::LeaveRoom(room_id) => ClientMessage::LeaveRoom {
                room_id: room_id.clone(),
            },
            Action::Disconnect | Action::Reject(_) => return None,
        };
        Some(ClientFrame::new(self.session_id.clone(), message))
    }
}
