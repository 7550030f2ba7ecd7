//! Admission control for Fishbowl sessions.
//!
//! Before a connection reaches a session, the server asks an
//! [`Authenticator`] whether its credential is good for the session id the
//! client named. Fishbowl ships two:
//!
//! - [`AllowAll`]: no checks; the credential (or `"anonymous"`) becomes
//!   the user id. For development and tests.
//! - [`TokenTable`]: a fixed map of `(session, token) → user`.
//!
//! # How it fits in the stack
//!
//! ```text
//! Server handshake (above)  ← calls validate() once per connection
//!     ↕
//! Auth Layer (this crate)
//!     ↕
//! Protocol Layer (below)  ← provides SessionId, UserId
//! ```

mod auth;
mod error;

pub use auth::{AllowAll, Authenticator, TokenTable};
pub use error::AuthError;
