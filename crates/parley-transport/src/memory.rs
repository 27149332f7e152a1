//! In-process duplex connections backed by Tokio channels.
//!
//! [`pair`] returns two connected ends: whatever one end sends, the
//! other receives. Closing (or dropping) one end makes the other end's
//! `recv` return `Ok(None)`, which is exactly what a clean WebSocket
//! close looks like to the layers above. This lets the chat harness be
//! driven deterministically without opening sockets.

use tokio::sync::{Mutex, mpsc};

use crate::{Connection, ConnectionId, Connector, TransportError};

/// One end of an in-memory duplex channel.
pub struct MemoryConnection {
    id: ConnectionId,
    // `None` once this end has been closed.
    tx: Mutex<Option<mpsc::UnboundedSender<Vec<u8>>>>,
    rx: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
}

/// Creates two connected [`MemoryConnection`] ends.
pub fn pair() -> (MemoryConnection, MemoryConnection) {
    let (a_tx, b_rx) = mpsc::unbounded_channel();
    let (b_tx, a_rx) = mpsc::unbounded_channel();
    let a = MemoryConnection {
        id: ConnectionId::next(),
        tx: Mutex::new(Some(a_tx)),
        rx: Mutex::new(a_rx),
    };
    let b = MemoryConnection {
        id: ConnectionId::next(),
        tx: Mutex::new(Some(b_tx)),
        rx: Mutex::new(b_rx),
    };
    (a, b)
}

impl Connection for MemoryConnection {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        let tx = self.tx.lock().await;
        let tx = tx.as_ref().ok_or_else(|| {
            TransportError::ConnectionClosed("closed locally".into())
        })?;
        tx.send(data.to_vec()).map_err(|_| {
            TransportError::ConnectionClosed("peer dropped".into())
        })
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        Ok(self.rx.lock().await.recv().await)
    }

    async fn close(&self) -> Result<(), TransportError> {
        // Dropping the sender ends the peer's receive stream.
        self.tx.lock().await.take();
        tracing::debug!(id = %self.id, "memory connection closed");
        Ok(())
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

/// A [`Connector`] that hands out a single pre-built [`MemoryConnection`].
///
/// The first `connect` call succeeds with the stored end; every later
/// call (or any call on a connector built with [`Default`]) fails with
/// [`TransportError::ConnectFailed`].
#[derive(Default)]
pub struct MemoryConnector {
    conn: std::sync::Mutex<Option<MemoryConnection>>,
}

impl MemoryConnector {
    /// Wraps one end of a [`pair`] so it can be "dialed" once.
    pub fn new(conn: MemoryConnection) -> Self {
        Self {
            conn: std::sync::Mutex::new(Some(conn)),
        }
    }
}

impl Connector for MemoryConnector {
    type Connection = MemoryConnection;

    async fn connect(
        &self,
        address: &str,
    ) -> Result<Self::Connection, TransportError> {
        // A poisoned lock only means another connect panicked; the
        // slot itself is still usable.
        let taken = match self.conn.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        taken.ok_or_else(|| TransportError::ConnectFailed {
            address: address.to_string(),
            source: std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "no in-memory peer available",
            ),
        })
    }
}
