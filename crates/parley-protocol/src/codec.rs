//! Codec trait and implementations for serializing/deserializing frames.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The rest of the client doesn't care HOW frames are serialized, it
//! just needs something that implements [`Codec`]. The chat server
//! speaks JSON, so [`JsonCodec`] is the only implementation today.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{FrameKind, ProtocolError, ServerMessage};

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// ## Trait bounds explained
///
/// - `Send + Sync` → safe to share between the harness task and the
///   reader task it spawns.
/// - `'static` → the codec owns everything it needs, so it can live
///   inside long-running async tasks.
///
/// `DeserializeOwned` (vs plain `Deserialize`) means the decoded value
/// doesn't borrow from the input bytes, so the receive buffer can be
/// dropped right after decoding.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::MalformedFrame` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// This is behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use parley_protocol::{ClientFrame, ClientMessage, Codec, JsonCodec, SessionId};
///
/// let codec = JsonCodec;
/// let frame = ClientFrame::new(
///     Some(SessionId::from("abc")),
///     ClientMessage::FetchRooms,
/// );
///
/// let bytes = codec.encode(&frame).unwrap();
/// let text = std::str::from_utf8(&bytes).unwrap();
/// assert!(text.contains(r#""kind":"Room#fetchRooms""#));
/// assert!(text.contains(r#""sessionId":"abc""#));
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::MalformedFrame)
    }
}

// ---------------------------------------------------------------------------
// Inbound decoding
// ---------------------------------------------------------------------------

/// Just enough of a frame to read its discriminator.
#[derive(Deserialize)]
struct KindProbe {
    kind: String,
}

/// Decodes one inbound frame.
///
/// Decoding happens in two steps: first only the `kind` field is read,
/// then, if the kind is one we understand, the whole frame. A kind we
/// don't understand is not an error: it comes back as
/// [`ServerMessage::Unknown`] so newer servers can add frame types
/// without breaking older clients.
///
/// # Errors
/// Returns the codec's decode error if the bytes aren't structured data,
/// carry no `kind`, or carry a known `kind` with a bad payload.
pub fn decode_server_message<C: Codec>(
    codec: &C,
    data: &[u8],
) -> Result<ServerMessage, ProtocolError> {
    let probe: KindProbe = codec.decode(data)?;
    match FrameKind::from_wire(&probe.kind) {
        FrameKind::Unknown(kind) => {
            tracing::debug!(%kind, "unknown frame kind");
            Ok(ServerMessage::Unknown { kind })
        }
        _ => codec.decode(data),
    }
}
