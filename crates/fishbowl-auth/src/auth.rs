//! The [`Authenticator`] hook and the two built-in implementations.
//!
//! Fishbowl doesn't own user accounts. Whoever deploys it decides what a
//! valid credential is by implementing [`Authenticator`]; the server calls
//! it once per connection, right after the handshake frame.

use std::collections::HashMap;
use std::future::Future;
use std::str::FromStr;

use fishbowl_protocol::{SessionId, UserId};
use rand::Rng;

use crate::AuthError;

/// Validates a credential for one session and returns who it belongs to.
///
/// `Send + Sync + 'static` because one authenticator is shared by every
/// connection task for the life of the server.
///
/// # Example
///
/// ```rust
/// use fishbowl_auth::{AuthError, Authenticator};
/// use fishbowl_protocol::{SessionId, UserId};
///
/// /// Lets anyone in whose credential starts with the session id.
/// struct PrefixAuth;
///
/// impl Authenticator for PrefixAuth {
///     async fn validate(
///         &self,
///         session: &SessionId,
///         credential: Option<&str>,
///     ) -> Result<UserId, AuthError> {
///         let credential = credential.ok_or(AuthError::MissingCredential)?;
///         match credential.strip_prefix(session.as_str()) {
///             Some(user) => Ok(UserId::from(user)),
///             None => Err(AuthError::InvalidCredential(session.to_string())),
///         }
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    /// Checks `credential` against `session`.
    ///
    /// # Returns
    /// - `Ok(UserId)`: admitted
    /// - `Err(AuthError::InvalidCredential)`: wrong credential for this
    ///   session
    /// - `Err(AuthError::MissingCredential)`: none given, one required
    fn validate(
        &self,
        session: &SessionId,
        credential: Option<&str>,
    ) -> impl Future<Output = Result<UserId, AuthError>> + Send;
}

// ---------------------------------------------------------------------------
// AllowAll
// ---------------------------------------------------------------------------

/// Admits every connection. The credential, if any, is used as the user id.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Authenticator for AllowAll {
    async fn validate(
        &self,
        _session: &SessionId,
        credential: Option<&str>,
    ) -> Result<UserId, AuthError> {
        Ok(UserId::from(credential.unwrap_or("anonymous")))
    }
}

// ---------------------------------------------------------------------------
// TokenTable
// ---------------------------------------------------------------------------

/// A fixed table of per-session tokens.
///
/// A token is only good for the session it was granted for. The table can
/// be built in code with [`grant`](Self::grant) / [`issue`](Self::issue),
/// or parsed from the `gid/token=user,…` form used by the `AUTH_TOKENS`
/// environment variable.
#[derive(Debug, Clone, Default)]
pub struct TokenTable {
    entries: HashMap<(SessionId, String), UserId>,
}

impl TokenTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allows `token` into `session` as `user`. Replaces any earlier grant
    /// of the same token for the same session.
    pub fn grant(
        &mut self,
        session: impl Into<SessionId>,
        token: impl Into<String>,
        user: impl Into<UserId>,
    ) -> &mut Self {
        self.entries
            .insert((session.into(), token.into()), user.into());
        self
    }

    /// Grants a freshly generated token and returns it.
    pub fn issue(&mut self, session: impl Into<SessionId>, user: impl Into<UserId>) -> String {
        let token = generate_token();
        self.grant(session, token.clone(), user);
        token
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Authenticator for TokenTable {
    async fn validate(
        &self,
        session: &SessionId,
        credential: Option<&str>,
    ) -> Result<UserId, AuthError> {
        let token = credential.ok_or(AuthError::MissingCredential)?;
        match self.entries.get(&(session.clone(), token.to_string())) {
            Some(user) => Ok(user.clone()),
            None => {
                tracing::debug!(%session, "credential rejected");
                Err(AuthError::InvalidCredential(session.to_string()))
            }
        }
    }
}

impl FromStr for TokenTable {
    type Err = AuthError;

    /// Parses `gid/token=user` entries separated by commas. Whitespace
    /// around entries is ignored, as are empty entries.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut table = Self::new();
        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let malformed = || AuthError::MalformedEntry(entry.to_string());
            let (key, user) = entry.split_once('=').ok_or_else(malformed)?;
            let (gid, token) = key.split_once('/').ok_or_else(malformed)?;
            let (gid, token, user) = (gid.trim(), token.trim(), user.trim());
            if gid.is_empty() || token.is_empty() || user.is_empty() {
                return Err(malformed());
            }
            table.grant(gid, token, user);
        }
        Ok(table)
    }
}

/// 32 lowercase hex characters (128 random bits).
fn generate_token() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// =========================================================================
// Tests
// =========================================================================
