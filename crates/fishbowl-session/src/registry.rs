//! Session registry: one [`TurnSession`] per session id.

use std::collections::HashMap;
use std::sync::Arc;

use fishbowl_protocol::{Codec, JsonCodec, ServerMessage, SessionId, UserId};
use fishbowl_transport::Connection;
use tokio::sync::Mutex;

use crate::{NameAssigner, SequentialNames, TableConfig, TableError, TableState, TurnSession};

/// Tracks every live session and routes new connections into them.
///
/// This is the entry point from the server's accept loop.
pub struct SessionRegistry<C: Connection> {
    sessions: Mutex<HashMap<SessionId, Arc<TurnSession<C>>>>,
    config: TableConfig,
    names: Arc<dyn NameAssigner>,
}

impl<C: Connection> SessionRegistry<C> {
    pub fn new(config: TableConfig) -> Self {
        Self::with_names(config, SequentialNames)
    }

    /// A registry whose sessions name players with `names`.
    pub fn with_names(config: TableConfig, names: impl NameAssigner) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            config,
            names: Arc::new(names),
        }
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// The session for `id`, created on first use. Concurrent callers with
    /// the same id always get the same instance.
    pub async fn find_or_create(&self, id: &SessionId) -> Arc<TurnSession<C>> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.entry(id.clone()).or_insert_with(|| {
            TurnSession::with_names(id.clone(), self.config.clone(), Arc::clone(&self.names))
        });
        Arc::clone(session)
    }

    pub async fn get(&self, id: &SessionId) -> Option<Arc<TurnSession<C>>> {
        self.sessions.lock().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    pub async fn session_ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.sessions.lock().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Admits `conn` into session `id` and runs its handler to completion.
    ///
    /// If the session refuses the connection, the client gets an error
    /// reply, the connection is closed, and the refusal is returned.
    pub async fn handle_connection(
        &self,
        id: &SessionId,
        user: UserId,
        conn: C,
    ) -> Result<(), TableError> {
        let session = self.find_or_create(id).await;
        let conn = Arc::new(conn);

        let handler = match session.admit(Arc::clone(&conn), user).await {
            Ok(handler) => handler,
            Err(e) => {
                tracing::info!(session_id = %id, conn_id = %conn.id(), error = %e, "admission refused");
                let bytes = JsonCodec.encode(&ServerMessage::error(e.to_string()))?;
                if let Err(send_err) = conn.send(&bytes).await {
                    tracing::debug!(conn_id = %conn.id(), error = %send_err, "refusal not delivered");
                }
                conn.close().await?;
                return Err(e);
            }
        };

        handler.run().await;
        drop(handler);
        self.prune().await;
        Ok(())
    }

    /// Drops sessions that can never be played again: past the lobby with
    /// no live connections. Returns how many were removed.
    ///
    /// Sessions past the lobby refuse admission, so nothing can join one
    /// between the check and the removal.
    pub async fn prune(&self) -> usize {
        let snapshot: Vec<(SessionId, Arc<TurnSession<C>>)> = self
            .sessions
            .lock()
            .await
            .iter()
            .map(|(id, s)| (id.clone(), Arc::clone(s)))
            .collect();

        let mut dead = Vec::new();
        for (id, session) in snapshot {
            if session.state().await != TableState::Lobby && session.handler_count().await == 0 {
                dead.push(id);
            }
        }
        if dead.is_empty() {
            return 0;
        }

        let mut sessions = self.sessions.lock().await;
        for id in &dead {
            sessions.remove(id);
            tracing::info!(session_id = %id, "session removed");
        }
        dead.len()
    }

    /// Stops every session, and through them every handler.
    pub async fn stop_all(&self) {
        let sessions: Vec<Arc<TurnSession<C>>> =
            self.sessions.lock().await.values().cloned().collect();
        tracing::info!(sessions = sessions.len(), "stopping all sessions");
        for session in sessions {
            session.stop().await;
        }
    }
}
