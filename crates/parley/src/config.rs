//! Client configuration.

/// Where the chat server lives unless told otherwise.
pub const DEFAULT_ADDRESS: &str = "ws://localhost:8080/chat";

/// Configuration for a [`ChatClient`](crate::ChatClient).
///
/// The server address is the only setting most users ever change; the
/// buffer sizes bound how far the reader task and the input thread may
/// run ahead of the dispatch loop before they wait.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server URL, e.g. `ws://localhost:8080/chat`.
    pub address: String,

    /// Capacity of the channel between the connection reader task and
    /// the dispatch loop.
    pub frame_buffer: usize,

    /// Capacity of the channel carrying typed lines.
    pub input_buffer: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            frame_buffer: 64,
            input_buffer: 16,
        }
    }
}
