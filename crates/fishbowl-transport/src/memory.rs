//! In-process connection pair backed by unbounded channels.
//!
//! [`MemoryConnection`] is the server side and implements [`Connection`];
//! [`MemoryPeer`] plays the client. Dropping or closing the peer looks like
//! a clean close to the server side, and [`MemoryPeer::reset`] injects a
//! transport fault.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{mpsc, Mutex};

use crate::{Connection, ConnectionId, TransportError};

/// What the peer pushes toward the server side.
enum Frame {
    Data(Vec<u8>),
    Reset,
}

/// Creates a connected server/client pair.
pub fn pair() -> (MemoryConnection, MemoryPeer) {
    let (to_server, from_peer) = mpsc::unbounded_channel();
    let (to_peer, from_server) = mpsc::unbounded_channel();

    let conn = MemoryConnection {
        id: ConnectionId::next(),
        outbound: to_peer,
        inbound: Mutex::new(from_peer),
        closed: AtomicBool::new(false),
    };
    let peer = MemoryPeer {
        outbound: Some(to_server),
        inbound: from_server,
    };
    (conn, peer)
}

/// Server side of an in-memory connection.
pub struct MemoryConnection {
    id: ConnectionId,
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    inbound: Mutex<mpsc::UnboundedReceiver<Frame>>,
    closed: AtomicBool,
}

impl MemoryConnection {
    /// Creates a connected pair. Same as [`pair`].
    pub fn pair() -> (MemoryConnection, MemoryPeer) {
        pair()
    }

    /// Returns `true` once [`Connection::close`] was called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Connection for MemoryConnection {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::ConnectionClosed(
                "closed locally".into(),
            ));
        }
        self.outbound.send(data.to_vec()).map_err(|_| {
            TransportError::ConnectionClosed("peer dropped".into())
        })
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        if self.is_closed() {
            return Ok(None);
        }
        match self.inbound.lock().await.recv().await {
            Some(Frame::Data(data)) => Ok(Some(data)),
            Some(Frame::Reset) => Err(TransportError::ReceiveFailed(
                std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "peer reset the connection",
                ),
            )),
            None => Ok(None),
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

/// Client side of an in-memory connection.
pub struct MemoryPeer {
    outbound: Option<mpsc::UnboundedSender<Frame>>,
    inbound: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl MemoryPeer {
    /// Sends one frame to the server side.
    pub fn send(&self, data: impl Into<Vec<u8>>) -> Result<(), TransportError> {
        let tx = self.outbound.as_ref().ok_or_else(|| {
            TransportError::ConnectionClosed("peer closed".into())
        })?;
        tx.send(Frame::Data(data.into())).map_err(|_| {
            TransportError::ConnectionClosed("server side dropped".into())
        })
    }

    /// Waits for the next frame from the server side.
    ///
    /// Returns `None` once the server side is dropped.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.inbound.recv().await
    }

    /// Returns the next frame if one is already queued.
    pub fn try_recv(&mut self) -> Option<Vec<u8>> {
        self.inbound.try_recv().ok()
    }

    /// Closes the client side; the server sees a clean close.
    pub fn close(&mut self) {
        self.outbound = None;
    }

    /// Makes the server's next `recv` fail with a transport error.
    pub fn reset(&mut self) {
        if let Some(tx) = self.outbound.take() {
            let _ = tx.send(Frame::Reset);
        }
    }
}
