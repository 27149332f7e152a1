//! Unified error type for the Parley client.

use parley_transport::TransportError;

/// Errors returned by the chat client.
///
/// Malformed frames, protocol violations and rejected input never show
/// up here: the harness reports them to the user and keeps running.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The connection could not be opened. The run loop never started.
    #[error("connection error: {0}")]
    Connect(#[source] TransportError),

    /// The server went away (or the transport failed) while running.
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// The terminal input could not be set up.
    #[error("cannot read input: {0}")]
    Input(#[source] std::io::Error),

    /// A transport-level error outside of connect/run (e.g. on close).
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ClientError {
    /// Returns `true` for errors that end the session.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Connect(_) | Self::ConnectionLost(_) | Self::Input(_)
        )
    }
}
