//! Per-connection handler: receive loop and request dispatch.
//!
//! Each admitted connection gets one [`ConnectionHandler`], run on its own
//! Tokio task. The flow is:
//!   1. Receive a frame (bounded wait, then re-check the stop flag)
//!   2. Decode it into a [`Request`]
//!   3. Run it against the session and reply on this connection
//!   4. On close, error, or stop: evict from the session

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use fishbowl_engine::{Card, Rank};
use fishbowl_protocol::{Codec, JsonCodec, Request, ServerEvent, ServerMessage, UserId};
use fishbowl_transport::{Connection, ConnectionId};

use crate::{TableError, TurnSession};

/// Mediates between one connection and its session.
pub struct ConnectionHandler<C: Connection> {
    conn: Arc<C>,
    session: Weak<TurnSession<C>>,
    player: String,
    user: UserId,
    recv_timeout: Duration,
    ready: AtomicBool,
    hand_sent: AtomicBool,
    stopped: AtomicBool,
}

impl<C: Connection> ConnectionHandler<C> {
    pub(crate) fn new(
        conn: Arc<C>,
        session: Weak<TurnSession<C>>,
        player: String,
        user: UserId,
        recv_timeout: Duration,
    ) -> Self {
        Self {
            conn,
            session,
            player,
            user,
            recv_timeout,
            ready: AtomicBool::new(false),
            hand_sent: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
        }
    }

    /// The name this connection plays under.
    pub fn player(&self) -> &str {
        &self.player
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    pub fn conn_id(&self) -> ConnectionId {
        self.conn.id()
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Asks the receive loop to exit. Takes effect within one receive
    /// timeout.
    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::AcqRel) {
            tracing::info!(conn_id = %self.conn_id(), player = %self.player, "stop requested");
        }
    }

    // -- Receive loop -----------------------------------------------------

    /// Runs until the connection closes, fails, or [`stop`](Self::stop) is
    /// called, then evicts this handler from its session.
    pub async fn run(&self) {
        let conn_id = self.conn_id();
        tracing::info!(%conn_id, player = %self.player, user = %self.user, "handler connected");

        while !self.is_stopped() {
            let data = match tokio::time::timeout(self.recv_timeout, self.conn.recv()).await {
                Err(_) => continue,
                Ok(Ok(Some(data))) => data,
                Ok(Ok(None)) => {
                    tracing::info!(%conn_id, player = %self.player, "connection closed cleanly");
                    break;
                }
                Ok(Err(e)) if e.is_closed() => {
                    tracing::info!(%conn_id, player = %self.player, error = %e, "connection closed");
                    break;
                }
                Ok(Err(e)) => {
                    tracing::error!(%conn_id, player = %self.player, error = %e, "receive failed");
                    break;
                }
            };

            if let Err(e) = self.dispatch(&data).await {
                tracing::error!(%conn_id, player = %self.player, error = %e, "reply failed");
                break;
            }
        }

        self.evict().await;
        tracing::info!(%conn_id, player = %self.player, "handler disconnected");
    }

    async fn evict(&self) {
        if let Some(session) = self.session.upgrade() {
            session.evict(self.conn_id()).await;
        }
    }

    /// Handles one inbound frame. Only a failure to write the reply is an
    /// error; bad requests get an error reply.
    async fn dispatch(&self, data: &[u8]) -> Result<(), TableError> {
        let request = match Request::decode(&JsonCodec, data) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(conn_id = %self.conn_id(), error = %e, "bad request");
                return self.send(&ServerMessage::error(e.to_string())).await;
            }
        };
        tracing::debug!(conn_id = %self.conn_id(), action = request.action(), "request");

        let Some(session) = self.session.upgrade() else {
            return self
                .send(&ServerMessage::error(TableError::SessionClosed.to_string()))
                .await;
        };

        match request {
            Request::PlayerReady => self.on_ready(&session).await,
            Request::DrawCard => self.on_draw(&session).await,
            Request::AskForCard {
                target_player_name,
                rank,
            } => self.on_ask(&session, &target_player_name, rank).await,
        }
    }

    async fn on_ready(&self, session: &Arc<TurnSession<C>>) -> Result<(), TableError> {
        self.ready.store(true, Ordering::Release);
        self.send(&ServerMessage::ack()).await?;
        session.broadcaster().check_all_ready(session).await;
        Ok(())
    }

    async fn on_draw(&self, session: &Arc<TurnSession<C>>) -> Result<(), TableError> {
        let _notices = session.notices().await;
        match session.draw(&self.player).await {
            Ok(drawn) => {
                self.send(&ServerMessage::drawn(drawn.card)).await?;
                session.announce(&drawn.turn).await;
                Ok(())
            }
            Err(e) => self.send(&ServerMessage::draw_error(e.to_string())).await,
        }
    }

    async fn on_ask(
        &self,
        session: &Arc<TurnSession<C>>,
        target: &str,
        rank: Rank,
    ) -> Result<(), TableError> {
        let _notices = session.notices().await;
        match session.ask(&self.player, target, rank).await {
            Ok(asked) => {
                self.send(&ServerEvent::ask_response(&asked.outcome).into())
                    .await?;
                session.announce(&asked.turn).await;
                Ok(())
            }
            Err(e) => self.send(&ServerMessage::error(e.to_string())).await,
        }
    }

    // -- Outbound ---------------------------------------------------------

    /// Encodes and writes one message to this connection.
    pub async fn send(&self, message: &ServerMessage) -> Result<(), TableError> {
        let bytes = JsonCodec.encode(message)?;
        self.conn.send(&bytes).await?;
        Ok(())
    }

    /// Sends `event`, logging instead of returning a failure. Used for
    /// messages triggered by other players' actions.
    pub async fn deliver(&self, event: ServerEvent) {
        if let Err(e) = self.send(&event.into()).await {
            tracing::warn!(conn_id = %self.conn_id(), player = %self.player, error = %e, "delivery failed");
        }
    }

    /// Sends this player's dealt cards. Only the first call sends anything.
    pub async fn send_initial_hand(&self, cards: Vec<Card>) -> Result<(), TableError> {
        if self.hand_sent.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.send(&ServerEvent::InitialHand { cards }.into()).await
    }
}
