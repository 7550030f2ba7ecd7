//! Unified error type for Fishbowl.

use fishbowl_auth::AuthError;
use fishbowl_engine::EngineError;
use fishbowl_protocol::ProtocolError;
use fishbowl_session::TableError;
use fishbowl_transport::TransportError;

use crate::ConfigError;

/// Top-level error that wraps every crate-specific error.
///
/// The `#[from]` attribute on each variant generates the `From` impl, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum FishbowlError {
    /// Connection, send, or receive failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Encode or decode failure, or a malformed request.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A Go Fish rule was broken.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The handshake credential was refused.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A session refused the connection or the action.
    #[error(transparent)]
    Table(#[from] TableError),

    /// Bad environment configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The client never sent a usable handshake frame.
    #[error("handshake failed: {0}")]
    Handshake(String),
}
