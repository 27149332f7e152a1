//! Console plumbing: reading typed lines and printing notifications.
//!
//! The harness never touches stdin or stdout directly. It consumes lines
//! from an `mpsc::Receiver<String>` and emits [`Notification`]s on an
//! `mpsc::UnboundedSender`, which lets tests drive it with plain
//! channels. The functions here connect those channels to the terminal.

use std::fmt;
use std::io::BufRead;

use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Something the user should see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A complete line of output.
    Line(String),
    /// A prompt; the cursor stays on the same line.
    Prompt(String),
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Line(text) | Self::Prompt(text) => f.write_str(text),
        }
    }
}

/// Starts the input thread and returns the channel it feeds.
///
/// Reading the terminal blocks, so this runs on a dedicated OS thread
/// rather than a Tokio task. The thread is never joined: once the
/// receiver is dropped its next send fails and it exits, and if it is
/// still parked in a read when the client finishes, process exit takes
/// it down.
///
/// # Errors
/// Returns the OS error if the thread can't be spawned.
pub fn spawn_stdin_reader(buffer: usize) -> std::io::Result<mpsc::Receiver<String>> {
    let (tx, rx) = mpsc::channel(buffer);
    std::thread::Builder::new()
        .name("parley-input".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to read input");
                        break;
                    }
                }
            }
            tracing::debug!("input thread finished");
        })?;
    Ok(rx)
}

/// Starts a task that prints notifications to stdout.
///
/// The task ends once every sender is dropped and the queue is drained;
/// await the handle to be sure everything was written.
pub fn spawn_printer() -> (mpsc::UnboundedSender<Notification>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<Notification>();
    let handle = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(notification) = rx.recv().await {
            let text = match notification {
                Notification::Line(line) => format!("{line}\n"),
                Notification::Prompt(prompt) => prompt,
            };
            if let Err(e) = write_flushed(&mut stdout, &text).await {
                tracing::warn!(error = %e, "failed to write to stdout");
                break;
            }
        }
    });
    (tx, handle)
}

async fn write_flushed(stdout: &mut tokio::io::Stdout, text: &str) -> std::io::Result<()> {
    stdout.write_all(text.as_bytes()).await?;
    stdout.flush().await
}
