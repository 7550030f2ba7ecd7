//! `FishbowlServer` builder and accept loop.
//!
//! This is the entry point for running a Go Fish server. It ties together
//! all the layers: transport → handshake/auth → session registry.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use fishbowl_auth::Authenticator;
use fishbowl_engine::Rules;
use fishbowl_session::{SessionRegistry, TableConfig};
use fishbowl_transport::{Transport, WebSocketConnection, WebSocketTransport};

use crate::handshake::handle_connection;
use crate::{FishbowlError, ServerConfig};

/// How long a new client has to finish the WebSocket upgrade, and then
/// again to send its handshake.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared server state passed to each connection task.
pub(crate) struct ServerState<A: Authenticator> {
    pub(crate) registry: SessionRegistry<WebSocketConnection>,
    pub(crate) auth: A,
    pub(crate) handshake_timeout: Duration,
}

/// Builder for configuring and starting a Fishbowl server.
///
/// # Example
///
/// ```rust,ignore
/// use fishbowl::prelude::*;
///
/// let server = FishbowlServer::builder()
///     .bind("0.0.0.0:10020")
///     .min_players(2)
///     .build(AllowAll)
///     .await?;
/// server.run().await
/// ```
pub struct FishbowlServerBuilder {
    bind_addr: String,
    table: TableConfig,
    handshake_timeout: Duration,
}

impl FishbowlServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:10020".to_string(),
            table: TableConfig::default(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }

    /// Bind address and table settings from a [`ServerConfig`].
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new()
            .bind(&config.bind_addr())
            .table_config(config.table.clone())
    }

    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    pub fn table_config(mut self, config: TableConfig) -> Self {
        self.table = config;
        self
    }

    pub fn min_players(mut self, n: usize) -> Self {
        self.table.min_players = n;
        self
    }

    pub fn max_players(mut self, n: usize) -> Self {
        self.table.max_players = n;
        self
    }

    pub fn recv_timeout(mut self, timeout: Duration) -> Self {
        self.table.recv_timeout = timeout;
        self
    }

    pub fn rules(mut self, rules: Rules) -> Self {
        self.table.rules = rules;
        self
    }

    /// Deal every game from the same shuffle. Useful for tests and demos.
    pub fn shuffle_seed(mut self, seed: u64) -> Self {
        self.table.shuffle_seed = Some(seed);
        self
    }

    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Binds the listener. The server doesn't accept anything until
    /// [`run`](FishbowlServer::run) is called.
    pub async fn build<A: Authenticator>(self, auth: A) -> Result<FishbowlServer<A>, FishbowlError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            registry: SessionRegistry::new(self.table),
            auth,
            handshake_timeout: self.handshake_timeout,
        });

        Ok(FishbowlServer { transport, state })
    }
}

impl Default for FishbowlServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Fishbowl server.
pub struct FishbowlServer<A: Authenticator> {
    transport: WebSocketTransport,
    state: Arc<ServerState<A>>,
}

impl<A: Authenticator> FishbowlServer<A> {
    pub fn builder() -> FishbowlServerBuilder {
        FishbowlServerBuilder::new()
    }

    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    pub fn registry(&self) -> &SessionRegistry<WebSocketConnection> {
        &self.state.registry
    }

    /// Accepts connections until the process is terminated.
    pub async fn run(self) -> Result<(), FishbowlError> {
        self.run_until(std::future::pending()).await
    }

    /// Accepts connections until `shutdown` resolves, then stops every
    /// session and closes the listener.
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()> + Send,
    ) -> Result<(), FishbowlError> {
        let addr = self
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".into());
        tracing::info!(%addr, "fishbowl server running");

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("shutdown requested");
                    break;
                }
                accepted = self.transport.accept_stream() => match accepted {
                    Ok((stream, peer)) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, peer, state).await {
                                tracing::debug!(%peer, error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }

        self.state.registry.stop_all().await;
        self.transport.shutdown().await?;
        tracing::info!("fishbowl server stopped");
        Ok(())
    }
}
