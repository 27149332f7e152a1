//! Core protocol types for the chat wire format.
//!
//! Every frame on the wire is a flat JSON object with a mandatory
//! `kind` discriminator, for example:
//!
//! ```text
//! {"kind":"Room#join","sessionId":"8f1c…","roomId":"42d0…"}
//! ```
//!
//! The same `kind` string is used in both directions: the client sends
//! `Room#join` to ask to join, and the server answers with `Room#join`
//! to confirm. The request and confirmation carry different fields, so
//! they are modelled as two separate enums, [`ClientMessage`] (outbound)
//! and [`ServerMessage`] (inbound).

use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The identifier the server assigns to our connection.
///
/// A "newtype wrapper" around the opaque string the server sends, so a
/// `SessionId` can't be passed where a `RoomId` is expected.
/// `#[serde(transparent)]` keeps the wire form a bare string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

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

/// A server-assigned room identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// ---------------------------------------------------------------------------
// Room and User
// ---------------------------------------------------------------------------

/// A named chat channel.
///
/// Two rooms are the same room when their ids match; the name is only
/// a label. That's why `PartialEq` and `Hash` are written by hand
/// instead of derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    #[serde(rename = "roomId")]
    pub id: RoomId,
    pub name: String,
}

impl Room {
    pub fn new(id: RoomId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl PartialEq for Room {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Room {}

impl Hash for Room {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A chat participant as described by an inbound event.
///
/// The server is inconsistent about the display-name field: the
/// registration reply calls it `username`, room events call it `name`.
/// Both are accepted here (`alias`), so the rest of the client only ever
/// sees `name`. Serialization always writes `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub session_id: SessionId,
    #[serde(alias = "username")]
    pub name: String,
}

// ---------------------------------------------------------------------------
// FrameKind
// ---------------------------------------------------------------------------

/// The meaning of an inbound frame, read from its `kind` field.
///
/// Unrecognised kinds are kept verbatim in [`FrameKind::Unknown`] rather
/// than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FrameKind {
    AuthChallenge,
    AuthAccepted,
    RoomList,
    RoomCreated,
    RoomJoined,
    RoomLeft,
    ChatReceived,
    ServerError,
    Unknown(String),
}

impl FrameKind {
    /// Maps a wire `kind` string to a `FrameKind`.
    pub fn from_wire(kind: &str) -> Self {
        match kind {
            "Auth#createUser" => Self::AuthChallenge,
            "Auth#authUser" => Self::AuthAccepted,
            "Room#fetchRooms" => Self::RoomList,
            "Room#createRoom" => Self::RoomCreated,
            "Room#join" => Self::RoomJoined,
            "Room#leave" => Self::RoomLeft,
            "Room#sendChat" => Self::ChatReceived,
            "error" => Self::ServerError,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// The wire `kind` string for this frame kind.
    pub fn as_wire(&self) -> &str {
        match self {
            Self::AuthChallenge => "Auth#createUser",
            Self::AuthAccepted => "Auth#authUser",
            Self::RoomList => "Room#fetchRooms",
            Self::RoomCreated => "Room#createRoom",
            Self::RoomJoined => "Room#join",
            Self::RoomLeft => "Room#leave",
            Self::ChatReceived => "Room#sendChat",
            Self::ServerError => "error",
            Self::Unknown(kind) => kind,
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

// ---------------------------------------------------------------------------
// Outbound frames
// ---------------------------------------------------------------------------

/// A request the client sends to the server.
///
/// `#[serde(tag = "kind")]` makes this an "internally tagged" enum: the
/// variant name is written into the `kind` field next to the variant's
/// own fields instead of wrapping them. Each variant is renamed to the
/// server's `Category#action` string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ClientMessage {
    /// Answers an auth challenge with the name we want to use.
    #[serde(rename = "Auth#createUser")]
    RegisterUsername { username: String },

    /// Asks for the list of open rooms.
    #[serde(rename = "Room#fetchRooms")]
    FetchRooms,

    #[serde(rename = "Room#createRoom")]
    CreateRoom { name: String },

    #[serde(rename = "Room#join", rename_all = "camelCase")]
    JoinRoom { room_id: RoomId },

    #[serde(rename = "Room#leave", rename_all = "camelCase")]
    LeaveRoom { room_id: RoomId },

    /// Posts a chat line to a room we're in.
    #[serde(rename = "Room#sendChat", rename_all = "camelCase")]
    SendChat { room_id: RoomId, content: String },
}

impl ClientMessage {
    /// The wire `kind` string, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RegisterUsername { .. } => "Auth#createUser",
            Self::FetchRooms => "Room#fetchRooms",
            Self::CreateRoom { .. } => "Room#createRoom",
            Self::JoinRoom { .. } => "Room#join",
            Self::LeaveRoom { .. } => "Room#leave",
            Self::SendChat { .. } => "Room#sendChat",
        }
    }
}

/// A complete outbound frame: a [`ClientMessage`] stamped with our
/// session id.
///
/// `#[serde(flatten)]` merges the message's fields (including `kind`)
/// into this object, so the wire form stays one flat JSON object. The
/// session id is left out entirely until the server has assigned one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientFrame {
    #[serde(
        rename = "sessionId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub session_id: Option<SessionId>,

    #[serde(flatten)]
    pub message: ClientMessage,
}

impl ClientFrame {
    pub fn new(session_id: Option<SessionId>, message: ClientMessage) -> Self {
        Self {
            session_id,
            message,
        }
    }
}

// ---------------------------------------------------------------------------
// Inbound frames
// ---------------------------------------------------------------------------

/// A frame received from the server.
///
/// Fields the client doesn't use are ignored on decode. Use
/// [`decode_server_message`](crate::decode_server_message) rather than a
/// plain codec decode, so that unknown kinds become [`Self::Unknown`]
/// instead of an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ServerMessage {
    /// The server assigned us a session id and wants a username.
    #[serde(rename = "Auth#createUser", rename_all = "camelCase")]
    AuthChallenge { session_id: SessionId },

    /// Our username was accepted.
    #[serde(rename = "Auth#authUser", rename_all = "camelCase")]
    AuthAccepted {
        #[serde(deserialize_with = "deserialize_timestamp")]
        joined_time: NaiveDateTime,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        username: Option<String>,
    },

    /// The full list of open rooms, in server order.
    #[serde(rename = "Room#fetchRooms")]
    RoomList { rooms: Vec<Room> },

    /// A room we asked for was created.
    #[serde(rename = "Room#createRoom", rename_all = "camelCase")]
    RoomCreated { room_id: RoomId, name: String },

    /// Someone (possibly us) joined a room.
    #[serde(rename = "Room#join", rename_all = "camelCase")]
    RoomJoined { room_id: RoomId, user: User },

    /// Someone (possibly us) left a room.
    #[serde(rename = "Room#leave", rename_all = "camelCase")]
    RoomLeft {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_id: Option<RoomId>,
        user: User,
    },

    /// A chat line posted to a room we're in.
    #[serde(rename = "Room#sendChat")]
    ChatReceived {
        #[serde(deserialize_with = "deserialize_timestamp")]
        timestamp: NaiveDateTime,
        user: User,
        content: String,
    },

    /// The server refused a request.
    #[serde(rename = "error")]
    ServerError { message: String },

    /// A frame whose `kind` this client doesn't know. Never on the wire
    /// as such; produced only by `decode_server_message`.
    #[serde(skip)]
    Unknown { kind: String },
}

impl ServerMessage {
    /// The kind of this frame.
    pub fn kind(&self) -> FrameKind {
        match self {
            Self::AuthChallenge { .. } => FrameKind::AuthChallenge,
            Self::AuthAccepted { .. } => FrameKind::AuthAccepted,
            Self::RoomList { .. } => FrameKind::RoomList,
            Self::RoomCreated { .. } => FrameKind::RoomCreated,
            Self::RoomJoined { .. } => FrameKind::RoomJoined,
            Self::RoomLeft { .. } => FrameKind::RoomLeft,
            Self::ChatReceived { .. } => FrameKind::ChatReceived,
            Self::ServerError { .. } => FrameKind::ServerError,
            Self::Unknown { kind } => FrameKind::Unknown(kind.clone()),
        }
    }
}

/// Parses a wire timestamp.
///
/// Accepts a plain ISO-8601 date-time (`2024-05-01T10:00:00`, a space
/// separator also works) or an RFC 3339 one with `Z` or a `+hh:mm`
/// offset. An offset is dropped and the wall-clock time it qualifies is
/// kept, so the chat line shows the time the server wrote.
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(stamped) = DateTime::parse_from_rfc3339(raw) {
        return Some(stamped.naive_local());
    }
    raw.parse::<NaiveDateTime>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("invalid timestamp {raw:?}"))
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn at(s: &str) -> NaiveDateTime {
        s.parse().expect("valid timestamp")
    }

    // -- Identity types --

    #[test]
    fn test_ids_serialize_as_bare_strings() {
        assert_eq!(
            serde_json::to_value(SessionId::from("s1")).unwrap(),
            json!("s1")
        );
        assert_eq!(serde_json::to_value(RoomId::from("r1")).unwrap(), json!("r1"));
    }

    #[test]
    fn test_room_equality_is_by_id() {
        let a = Room::new(RoomId::from("r1"), "Lobby");
        let renamed = Room::new(RoomId::from("r1"), "Main hall");
        let other = Room::new(RoomId::from("r2"), "Lobby");
        assert_eq!(a, renamed);
        assert_ne!(a, other);
    }

    #[test]
    fn test_room_uses_room_id_on_the_wire() {
        let room: Room =
            serde_json::from_value(json!({"roomId": "r1", "name": "Lobby"}))
                .unwrap();
        assert_eq!(room.id, RoomId::from("r1"));
        assert_eq!(room.name, "Lobby");
    }

    // -- User name fallback --

    #[test]
    fn test_user_accepts_name() {
        let user: User =
            serde_json::from_value(json!({"sessionId": "s1", "name": "ada"}))
                .unwrap();
        assert_eq!(user.name, "ada");
    }

    #[test]
    fn test_user_accepts_username() {
        let user: User = serde_json::from_value(
            json!({"sessionId": "s1", "username": "ada"}),
        )
        .unwrap();
        assert_eq!(user.name, "ada");
        assert_eq!(user.session_id, SessionId::from("s1"));
    }

    #[test]
    fn test_user_without_any_name_is_rejected() {
        let result: Result<User, _> =
            serde_json::from_value(json!({"sessionId": "s1"}));
        assert!(result.is_err());
    }

    // -- FrameKind --

    #[test]
    fn test_frame_kind_wire_mapping_is_symmetric() {
        for kind in [
            FrameKind::AuthChallenge,
            FrameKind::AuthAccepted,
            FrameKind::RoomList,
            FrameKind::RoomCreated,
            FrameKind::RoomJoined,
            FrameKind::RoomLeft,
            FrameKind::ChatReceived,
            FrameKind::ServerError,
        ] {
            assert_eq!(FrameKind::from_wire(kind.as_wire()), kind);
        }
    }

    #[test]
    fn test_frame_kind_keeps_unknown_text() {
        let kind = FrameKind::from_wire("Room#typing");
        assert_eq!(kind, FrameKind::Unknown("Room#typing".into()));
        assert_eq!(kind.to_string(), "Room#typing");
    }

    // -- Outbound frames --

    #[test]
    fn test_client_frame_wire_shapes() {
        let sid = Some(SessionId::from("s1"));
        let cases = [
            (
                ClientMessage::RegisterUsername {
                    username: "ada".into(),
                },
                json!({"kind": "Auth#createUser", "sessionId": "s1", "username": "ada"}),
            ),
            (
                ClientMessage::FetchRooms,
                json!({"kind": "Room#fetchRooms", "sessionId": "s1"}),
            ),
            (
                ClientMessage::CreateRoom {
                    name: "Lobby".into(),
                },
                json!({"kind": "Room#createRoom", "sessionId": "s1", "name": "Lobby"}),
            ),
            (
                ClientMessage::JoinRoom {
                    room_id: RoomId::from("r1"),
                },
                json!({"kind": "Room#join", "sessionId": "s1", "roomId": "r1"}),
            ),
            (
                ClientMessage::LeaveRoom {
                    room_id: RoomId::from("r1"),
                },
                json!({"kind": "Room#leave", "sessionId": "s1", "roomId": "r1"}),
            ),
            (
                ClientMessage::SendChat {
                    room_id: RoomId::from("r1"),
                    content: "hello there".into(),
                },
                json!({"kind": "Room#sendChat", "sessionId": "s1", "roomId": "r1", "content": "hello there"}),
            ),
        ];

        for (message, expected) in cases {
            let kind = message.kind();
            let frame = ClientFrame::new(sid.clone(), message);
            let value = serde_json::to_value(&frame).unwrap();
            assert_eq!(value, expected);
            assert_eq!(value["kind"], kind);
        }
    }

    #[test]
    fn test_client_frame_omits_unassigned_session_id() {
        let frame = ClientFrame::new(None, ClientMessage::FetchRooms);
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value, json!({"kind": "Room#fetchRooms"}));
    }

    #[test]
    fn test_client_frame_decodes_back() {
        let frame = ClientFrame::new(
            Some(SessionId::from("s1")),
            ClientMessage::SendChat {
                room_id: RoomId::from("r1"),
                content: "hi".into(),
            },
        );
        let bytes = serde_json::to_vec(&frame).unwrap();
        let back: ClientFrame = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, frame);
    }

    // -- Inbound frames --

    #[test]
    fn test_server_message_auth_accepted() {
        let msg: ServerMessage = serde_json::from_value(json!({
            "kind": "Auth#authUser",
            "sessionId": "s1",
            "username": "ada",
            "joinedTime": "2024-05-01T10:15:30.123456"
        }))
        .unwrap();
        assert_eq!(
            msg,
            ServerMessage::AuthAccepted {
                joined_time: at("2024-05-01T10:15:30.123456"),
                username: Some("ada".into()),
            }
        );
        assert_eq!(msg.kind(), FrameKind::AuthAccepted);
    }

    #[test]
    fn test_server_message_room_list_keeps_order() {
        let msg: ServerMessage = serde_json::from_value(json!({
            "kind": "Room#fetchRooms",
            "sessionId": "s1",
            "rooms": [
                {"roomId": "r2", "name": "Beta"},
                {"roomId": "r1", "name": "Alpha"}
            ]
        }))
        .unwrap();
        let ServerMessage::RoomList { rooms } = msg else {
            panic!("expected RoomList");
        };
        let names: Vec<_> = rooms.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Beta", "Alpha"]);
    }

    #[test]
    fn test_server_message_chat_received() {
        let msg: ServerMessage = serde_json::from_value(json!({
            "kind": "Room#sendChat",
            "roomId": "r1",
            "timestamp": "2024-05-01T10:15:30",
            "content": "hello",
            "user": {"sessionId": "s2", "name": "bob", "joinedTime": "2024-05-01T10:00:00"}
        }))
        .unwrap();
        assert_eq!(
            msg,
            ServerMessage::ChatReceived {
                timestamp: at("2024-05-01T10:15:30"),
                user: User {
                    session_id: SessionId::from("s2"),
                    name: "bob".into(),
                },
                content: "hello".into(),
            }
        );
    }

    #[test]
    fn test_server_message_room_left_without_room_id() {
        let msg: ServerMessage = serde_json::from_value(json!({
            "kind": "Room#leave",
            "user": {"sessionId": "s1", "name": "admin"}
        }))
        .unwrap();
        assert!(matches!(msg, ServerMessage::RoomLeft { room_id: None, .. }));
    }

    #[test]
    fn test_server_message_error_frame() {
        let msg: ServerMessage = serde_json::from_value(json!({
            "kind": "error",
            "sessionId": "s1",
            "message": "room already exists",
            "timestamp": "2024-05-01T10:15:30"
        }))
        .unwrap();
        assert_eq!(
            msg,
            ServerMessage::ServerError {
                message: "room already exists".into()
            }
        );
    }

    #[test]
    fn test_request_and_confirmation_share_kind() {
        // A create request encodes to the same `kind` the server uses to
        // confirm it, and the confirmation decodes to the matching name.
        let request = ClientFrame::new(
            None,
            ClientMessage::CreateRoom {
                name: "Lobby".into(),
            },
        );
        let mut value = serde_json::to_value(&request).unwrap();
        value["roomId"] = json!("r1");
        let confirmation: ServerMessage = serde_json::from_value(value).unwrap();
        assert_eq!(
            confirmation,
            ServerMessage::RoomCreated {
                room_id: RoomId::from("r1"),
                name: "Lobby".into(),
            }
        );
    }

    // -- Timestamps --

    #[test]
    fn test_timestamp_accepts_naive_and_offset_forms() {
        let expected = at("2024-05-01T10:00:00");
        for raw in [
            "2024-05-01T10:00:00",
            "2024-05-01 10:00:00",
            "2024-05-01T10:00:00Z",
            "2024-05-01T10:00:00+09:00",
        ] {
            assert_eq!(parse_timestamp(raw), Some(expected), "{raw}");
        }
        assert_eq!(
            parse_timestamp("2024-05-01T10:00:00.250-03:00"),
            Some(at("2024-05-01T10:00:00.250"))
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_auth_accepted_with_utc_timestamp() {
        let msg: ServerMessage = serde_json::from_value(json!({
            "kind": "Auth#authUser",
            "joinedTime": "2024-05-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(
            msg,
            ServerMessage::AuthAccepted {
                joined_time: at("2024-05-01T10:00:00"),
                username: None,
            }
        );
    }

    #[test]
    fn test_chat_with_offset_timestamp() {
        let msg: ServerMessage = serde_json::from_value(json!({
            "kind": "Room#sendChat",
            "timestamp": "2024-05-01T10:15:30+09:00",
            "content": "hi",
            "user": {"sessionId": "s2", "name": "bob"}
        }))
        .unwrap();
        let ServerMessage::ChatReceived { timestamp, .. } = msg else {
            panic!("expected a chat frame, got {msg:?}");
        };
        assert_eq!(timestamp, at("2024-05-01T10:15:30"));
    }

    #[test]
    fn test_bad_timestamp_is_a_decode_error() {
        let result = serde_json::from_value::<ServerMessage>(json!({
            "kind": "Auth#authUser",
            "joinedTime": "soon"
        }));
        assert!(result.is_err());
    }

    // -- Requests and their confirmations --

    /// Encodes `request`, adds the fields only the server fills in, and
    /// decodes the result as a server frame.
    fn confirm(request: ClientMessage, server_fields: serde_json::Value) -> ServerMessage {
        let frame = ClientFrame::new(Some(SessionId::from("s1")), request);
        let mut value = serde_json::to_value(&frame).unwrap();
        for (key, field) in server_fields.as_object().unwrap() {
            value[key] = field.clone();
        }
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_join_request_matches_join_confirmation() {
        let msg = confirm(
            ClientMessage::JoinRoom {
                room_id: RoomId::from("r1"),
            },
            json!({"user": {"sessionId": "s1", "name": "admin"}}),
        );
        assert_eq!(
            msg,
            ServerMessage::RoomJoined {
                room_id: RoomId::from("r1"),
                user: User {
                    session_id: SessionId::from("s1"),
                    name: "admin".into(),
                },
            }
        );
    }

    #[test]
    fn test_leave_request_matches_leave_confirmation() {
        let msg = confirm(
            ClientMessage::LeaveRoom {
                room_id: RoomId::from("r1"),
            },
            json!({"user": {"sessionId": "s1", "name": "admin"}}),
        );
        assert!(matches!(
            msg,
            ServerMessage::RoomLeft { room_id: Some(ref id), .. } if *id == RoomId::from("r1")
        ));
    }

    #[test]
    fn test_chat_request_matches_chat_broadcast() {
        let msg = confirm(
            ClientMessage::SendChat {
                room_id: RoomId::from("r1"),
                content: "hello there".into(),
            },
            json!({
                "timestamp": "2024-05-01T10:15:30",
                "user": {"sessionId": "s1", "name": "admin"}
            }),
        );
        assert_eq!(
            msg,
            ServerMessage::ChatReceived {
                timestamp: at("2024-05-01T10:15:30"),
                user: User {
                    session_id: SessionId::from("s1"),
                    name: "admin".into(),
                },
                content: "hello there".into(),
            }
        );
    }

    #[test]
    fn test_register_request_matches_challenge_kind() {
        let msg = confirm(
            ClientMessage::RegisterUsername {
                username: "admin".into(),
            },
            json!({}),
        );
        assert_eq!(
            msg,
            ServerMessage::AuthChallenge {
                session_id: SessionId::from("s1")
            }
        );
    }
}
