//! # Fishbowl
//!
//! A multiplayer Go Fish server. Clients connect over WebSockets, name a
//! session in their handshake, and play in turn with everyone else who
//! named the same session.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fishbowl::prelude::*;
//!
//! # async fn demo() -> Result<(), FishbowlError> {
//! fishbowl::init_tracing();
//! let config = ServerConfig::from_env()?;
//! let server = FishbowlServerBuilder::from_config(&config)
//!     .build(config.authenticator())
//!     .await?;
//! server.run().await
//! # }
//! ```
//!
//! ## Crates
//!
//! - `fishbowl-engine`: cards, deck, and Go Fish rules
//! - `fishbowl-protocol`: the JSON messages clients and server exchange
//! - `fishbowl-transport`: WebSocket and in-memory connections
//! - `fishbowl-auth`: handshake credential checks
//! - `fishbowl-session`: sessions, turns, per-connection handlers

mod config;
mod error;
mod handshake;
mod server;

pub use config::{ConfigError, ConfiguredAuth, DEFAULT_LOCAL_IP, DEFAULT_PORT, ServerConfig};
pub use error::FishbowlError;
pub use server::{DEFAULT_HANDSHAKE_TIMEOUT, FishbowlServer, FishbowlServerBuilder};

pub use fishbowl_auth as auth;
pub use fishbowl_engine as engine;
pub use fishbowl_protocol as protocol;
pub use fishbowl_session as session;
pub use fishbowl_transport as transport;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Installs a `fmt` subscriber filtered by `RUST_LOG` (default `info`).
///
/// Does nothing if a global subscriber is already set.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false))
        .try_init();
}

/// Everything needed to run a server or write a client against it.
pub mod prelude {
    pub use crate::{
        ConfiguredAuth, FishbowlError, FishbowlServer, FishbowlServerBuilder, ServerConfig,
    };
    pub use fishbowl_auth::{AllowAll, Authenticator, TokenTable};
    pub use fishbowl_engine::{Card, GameOverPolicy, Rank, Rules, Suit};
    pub use fishbowl_protocol::{Handshake, Request, ServerEvent, ServerMessage, SessionId, UserId};
    pub use fishbowl_session::{SessionRegistry, TableConfig, TableState, TurnSession};
}
