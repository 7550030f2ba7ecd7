//! Error types for the protocol layer.
//!
//! A `ProtocolError` always means the *message* was bad, never the
//! connection. The session layer answers it with an error reply and keeps
//! the connection open.

/// Errors that can occur while encoding, decoding, or interpreting a
/// message.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, or the right JSON with the
    /// wrong shape.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The request had neither `action` nor `command`.
    #[error("message has no action")]
    MissingAction,

    /// The `action` names something the server doesn't do.
    #[error("unknown action '{0}'")]
    UnknownAction(String),

    /// A field the action requires is absent or empty.
    #[error("missing field '{0}'")]
    MissingField(&'static str),

    /// `rank` is present but isn't one of `2-10, J, Q, K, A`.
    #[error("invalid rank '{0}'")]
    InvalidRank(String),
}
