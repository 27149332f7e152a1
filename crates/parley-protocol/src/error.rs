//! Error types for the protocol layer.
//!
//! Each crate in Parley defines its own error enum. When you see a
//! `ProtocolError`, you know the problem is in turning frames into
//! bytes or bytes into frames, not in networking or session state.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a frame into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The bytes could not be read as a frame.
    ///
    /// Covers non-JSON input, a missing or non-string `kind`, and a
    /// known `kind` whose payload fields are missing or mistyped. The
    /// harness drops such frames and keeps running.
    #[cfg(feature = "json")]
    #[error("malformed frame: {0}")]
    MalformedFrame(serde_json::Error),
}
