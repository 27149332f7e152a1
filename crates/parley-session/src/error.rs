//! Error types for the session layer.

/// Errors that can occur while applying inbound frames to a session.
///
/// None of these are fatal: the harness reports them to the user and
/// keeps the session running with its state unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The server sent a frame that contradicts what we know, e.g. a
    /// join confirmation for a room we've never heard of.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),
}
