//! `ChatClient` builder and run loop.
//!
//! This is the entry point for running a chat session. It ties together
//! all the layers: transport → protocol → session, plus the console.
//!
//! # Concurrency model
//!
//! Two things happen at once while the client runs: frames arrive from
//! the server, and the user types lines. Rather than letting each source
//! mutate the session from its own call stack, both are funnelled into
//! one loop:
//!
//! ```text
//!  reader task ──(Inbound)──┐
//!                           ├──→ run loop ──→ Session ──→ conn.send()
//!  input thread ──(line)────┘        │
//!                                    └──→ Notification channel
//! ```
//!
//! The run loop is the only code that touches the [`Session`] and the
//! only code that writes to the connection, so an auto-join triggered by
//! an inbound frame can never interleave with a command the user typed.
//! Inbound frames are handled strictly in arrival order.

use std::sync::Arc;

use parley_protocol::{Codec, JsonCodec, decode_server_message};
use parley_session::{
    Action, Effect, Rejection, Session, USERNAME_PROMPT, interpret,
};
use parley_transport::{Connection, Connector, TransportError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::{ClientConfig, ClientError, Notification};

/// Builder for configuring and connecting a [`ChatClient`].
///
/// # Example
///
/// ```rust,no_run
/// use parley::prelude::*;
///
/// # async fn demo() -> Result<(), ClientError> {
/// let mut client = ChatClient::builder()
///     .address("ws://localhost:8080/chat")
///     .connect(&WebSocketConnector)
///     .await?;
///
/// let input = spawn_stdin_reader(16).expect("input thread");
/// let (output, printer) = spawn_printer();
/// client.run(input, &output).await?;
/// # drop(output);
/// # let _ = printer.await;
/// # Ok(())
/// # }
/// ```
pub struct ChatClientBuilder<K: Codec = JsonCodec> {
    config: ClientConfig,
    codec: K,
}

impl ChatClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            codec: JsonCodec,
        }
    }
}

impl Default for ChatClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Codec> ChatClientBuilder<K> {
    /// Sets the server address to connect to.
    pub fn address(mut self, address: &str) -> Self {
        self.config.address = address.to_string();
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses a different frame codec.
    pub fn codec<K2: Codec>(self, codec: K2) -> ChatClientBuilder<K2> {
        ChatClientBuilder {
            config: self.config,
            codec,
        }
    }

    /// Opens the connection.
    ///
    /// # Errors
    /// Returns [`ClientError::Connect`] if the connector fails. No
    /// client is created in that case.
    pub async fn connect<T: Connector>(
        self,
        connector: &T,
    ) -> Result<ChatClient<T::Connection, K>, ClientError> {
        let conn = connector
            .connect(&self.config.address)
            .await
            .map_err(ClientError::Connect)?;

        tracing::info!(
            address = %self.config.address,
            conn_id = %conn.id(),
            "connected to chat server"
        );

        Ok(ChatClient {
            conn: Arc::new(conn),
            codec: self.codec,
            session: Session::new(),
            config: self.config,
        })
    }
}

/// An event from the connection reader task.
enum Inbound {
    Frame(Vec<u8>),
    Closed,
    Failed(TransportError),
}

/// Whether the run loop should keep going after handling an event.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// Aborts the reader task when the run loop exits, however it exits.
struct ReaderGuard(JoinHandle<()>);

impl Drop for ReaderGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// A connected chat client.
///
/// Call [`run()`](Self::run) to start the session.
pub struct ChatClient<C: Connection, K: Codec = JsonCodec> {
    conn: Arc<C>,
    codec: K,
    session: Session,
    config: ClientConfig,
}

impl ChatClient<parley_transport::WebSocketConnection> {
    /// Creates a new builder.
    pub fn builder() -> ChatClientBuilder {
        ChatClientBuilder::new()
    }
}

impl<C: Connection, K: Codec> ChatClient<C, K> {
    /// The current session state.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Runs the session until the user exits or the connection ends.
    ///
    /// `input` carries typed lines; `output` receives everything the
    /// user should see. If `input` closes (end of input), the client
    /// keeps processing server frames until the connection ends.
    ///
    /// # Errors
    /// Returns [`ClientError::ConnectionLost`] when the server closes the
    /// connection or the transport fails. `Ok(())` means the user asked
    /// to leave with `/exit` and the connection was closed.
    pub async fn run(
        &mut self,
        mut input: mpsc::Receiver<String>,
        output: &mpsc::UnboundedSender<Notification>,
    ) -> Result<(), ClientError> {
        let (frame_tx, mut frames) = mpsc::channel(self.config.frame_buffer);
        let _reader = ReaderGuard(tokio::spawn(read_frames(
            Arc::clone(&self.conn),
            frame_tx,
        )));
        let mut input_open = true;

        loop {
            tokio::select! {
                inbound = frames.recv() => match inbound {
                    Some(Inbound::Frame(data)) => {
                        self.handle_frame(&data, output).await?;
                    }
                    Some(Inbound::Closed) | None => {
                        return Err(self.lost("server closed the connection", output));
                    }
                    Some(Inbound::Failed(e)) => {
                        return Err(self.lost(&e.to_string(), output));
                    }
                },
                line = input.recv(), if input_open => match line {
                    Some(line) => {
                        if self.handle_line(&line, output).await? == Flow::Stop {
                            if let Err(e) = self.close().await {
                                tracing::debug!(error = %e, "close after exit failed");
                            }
                            tracing::info!("client disconnected by user");
                            return Ok(());
                        }
                    }
                    None => {
                        tracing::debug!("input closed, still listening to server");
                        input_open = false;
                    }
                },
            }
        }
    }

    /// Closes the connection.
    ///
    /// # Errors
    /// Returns the transport error if the close handshake fails.
    pub async fn close(&self) -> Result<(), ClientError> {
        self.conn.close().await?;
        Ok(())
    }

    /// Decodes one frame, applies it, and carries out its effects.
    async fn handle_frame(
        &mut self,
        data: &[u8],
        output: &mpsc::UnboundedSender<Notification>,
    ) -> Result<(), ClientError> {
        let frame = match decode_server_message(&self.codec, data) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, len = data.len(), "dropping frame");
                notify(output, format!("dropped a frame from the server: {e}"));
                return Ok(());
            }
        };

        tracing::debug!(kind = %frame.kind(), "inbound frame");
        let effects = match self.session.apply(frame) {
            Ok(effects) => effects,
            Err(e) => {
                tracing::warn!(error = %e, "inbound frame rejected");
                notify(output, e.to_string());
                return Ok(());
            }
        };

        for effect in effects {
            match effect {
                Effect::Notify(line) => notify(output, line),
                Effect::Prompt(prompt) => prompt_user(output, prompt),
                Effect::Send(action) => {
                    // Frames never ask us to disconnect, so the flow
                    // result only matters for typed lines.
                    self.perform(action, output).await?;
                }
            }
        }
        Ok(())
    }

    async fn handle_line(
        &mut self,
        line: &str,
        output: &mpsc::UnboundedSender<Notification>,
    ) -> Result<Flow, ClientError> {
        let action = interpret(line, &self.session);
        self.perform(action, output).await
    }

    /// Carries out one action: send its frame, or report why not.
    async fn perform(
        &mut self,
        action: Action,
        output: &mpsc::UnboundedSender<Notification>,
    ) -> Result<Flow, ClientError> {
        match &action {
            Action::Disconnect => return Ok(Flow::Stop),
            Action::Reject(rejection) => {
                if !rejection.is_silent() {
                    notify(output, rejection.to_string());
                }
                if *rejection == Rejection::EmptyUsername {
                    prompt_user(output, USERNAME_PROMPT.to_string());
                }
                return Ok(Flow::Continue);
            }
            _ => {}
        }

        let Some(frame) = self.session.to_wire(&action) else {
            return Ok(Flow::Continue);
        };
        let bytes = match self.codec.encode(&frame) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode frame");
                notify(output, format!("could not send request: {e}"));
                return Ok(Flow::Continue);
            }
        };

        tracing::debug!(kind = frame.message.kind(), "outbound frame");
        self.conn
            .send(&bytes)
            .await
            .map_err(|e| self.lost(&e.to_string(), output))?;
        Ok(Flow::Continue)
    }

    fn lost(
        &self,
        reason: &str,
        output: &mpsc::UnboundedSender<Notification>,
    ) -> ClientError {
        tracing::info!(conn_id = %self.conn.id(), reason, "connection lost");
        notify(output, format!("connection lost: {reason}"));
        ClientError::ConnectionLost(reason.to_string())
    }
}

/// Drains the connection into the run loop's channel.
///
/// Stops after forwarding a close or failure, or when the run loop has
/// gone away.
async fn read_frames<C: Connection>(conn: Arc<C>, tx: mpsc::Sender<Inbound>) {
    loop {
        let event = match conn.recv().await {
            Ok(Some(data)) => Inbound::Frame(data),
            Ok(None) => Inbound::Closed,
            Err(e) => Inbound::Failed(e),
        };
        let last = !matches!(event, Inbound::Frame(_));
        if tx.send(event).await.is_err() || last {
            break;
        }
    }
}

// The user may have closed the printer already; nothing useful to do
// about a notification nobody can see.
fn notify(output: &mpsc::UnboundedSender<Notification>, line: String) {
    let _ = output.send(Notification::Line(line));
}

fn prompt_user(output: &mpsc::UnboundedSender<Notification>, prompt: String) {
    let _ = output.send(Notification::Prompt(prompt));
}
