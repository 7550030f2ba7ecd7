//! Error types for the auth layer.

/// Why a connection was refused entry to a session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The credential doesn't match anything issued for this session.
    #[error("invalid credential for session '{0}'")]
    InvalidCredential(String),

    /// The handshake carried no credential and this authenticator needs
    /// one.
    #[error("credential required")]
    MissingCredential,

    /// A token table in text form couldn't be parsed.
    #[error("malformed token entry '{0}' (expected gid/token=user)")]
    MalformedEntry(String),
}
