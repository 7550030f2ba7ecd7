//! Fan-out to every connection in a session.
//!
//! The broadcaster keeps two lists: raw subscribed connections (for events
//! everyone gets verbatim) and registered handlers (for per-player
//! messages like turn notifications). Both are snapshotted under the lock
//! and written to after it's released, so a slow client never holds up
//! another task waiting on the lock.

use std::sync::Arc;

use fishbowl_protocol::{Codec, JsonCodec, ServerEvent, ServerMessage};
use fishbowl_transport::{Connection, ConnectionId};
use tokio::sync::Mutex;

use crate::{ConnectionHandler, TurnSession};

/// Subscribers and handlers for one session.
pub struct Broadcaster<C: Connection> {
    subscribers: Mutex<Vec<Arc<C>>>,
    handlers: Mutex<Vec<Arc<ConnectionHandler<C>>>>,
}

impl<C: Connection> Broadcaster<C> {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            handlers: Mutex::new(Vec::new()),
        }
    }

    // -- Subscribers ------------------------------------------------------

    pub async fn subscribe(&self, conn: Arc<C>) {
        let conn_id = conn.id();
        self.subscribers.lock().await.push(conn);
        tracing::debug!(%conn_id, "subscriber added");
    }

    /// Removes the subscriber with `conn_id`. No-op if it isn't there.
    pub async fn unsubscribe(&self, conn_id: ConnectionId) {
        let mut subscribers = self.subscribers.lock().await;
        let before = subscribers.len();
        subscribers.retain(|c| c.id() != conn_id);
        if subscribers.len() != before {
            tracing::debug!(%conn_id, "subscriber removed");
        }
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.lock().await.len()
    }

    /// Sends `event` to every subscriber.
    ///
    /// A failed send is logged and skipped; the failing connection's own
    /// handler will see the fault on its next receive and evict itself.
    pub async fn publish(&self, event: ServerEvent) {
        let message = ServerMessage::from(event);
        let bytes = match JsonCodec.encode(&message) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode event");
                return;
            }
        };

        let subscribers: Vec<Arc<C>> = self.subscribers.lock().await.clone();
        tracing::debug!(subscribers = subscribers.len(), ?message, "publishing event");
        for conn in subscribers {
            if let Err(e) = conn.send(&bytes).await {
                tracing::warn!(conn_id = %conn.id(), error = %e, "publish failed");
            }
        }
    }

    // -- Handlers ---------------------------------------------------------

    pub async fn register_handler(&self, handler: Arc<ConnectionHandler<C>>) {
        self.handlers.lock().await.push(handler);
    }

    /// Removes the handler bound to `conn_id`. No-op if it isn't there.
    pub async fn unregister_handler(&self, conn_id: ConnectionId) {
        self.handlers
            .lock()
            .await
            .retain(|h| h.conn_id() != conn_id);
    }

    /// Snapshot of the registered handlers.
    pub async fn handlers(&self) -> Vec<Arc<ConnectionHandler<C>>> {
        self.handlers.lock().await.clone()
    }

    /// Sends `your_turn` to `current`'s handler and `wait` to everyone
    /// else's.
    pub async fn notify_turn(&self, current: &str) {
        for handler in self.handlers().await {
            let event = if handler.player() == current {
                ServerEvent::YourTurn
            } else {
                ServerEvent::Wait {
                    player_turn: current.to_string(),
                }
            };
            handler.deliver(event).await;
        }
    }

    /// Starts the game if every seated player is ready, there are at least
    /// `min_players` of them, and the session is still in the lobby.
    ///
    /// Returns whether this call started the game. Safe to call from every
    /// handler at once: the check runs under the session lock, and the
    /// game starts at most once.
    pub async fn check_all_ready(&self, session: &Arc<TurnSession<C>>) -> bool {
        session.start_if_all_ready().await
    }
}

impl<C: Connection> Default for Broadcaster<C> {
    fn default() -> Self {
        Self::new()
    }
}
