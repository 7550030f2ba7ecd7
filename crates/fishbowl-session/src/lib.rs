//! Session coordination for Fishbowl.
//!
//! Each session is one Go Fish game shared by a handful of connections.
//! Every connection runs its own [`ConnectionHandler`] task; the handlers
//! of a session share one [`TurnSession`] and its [`Broadcaster`].
//!
//! # Key types
//!
//! - [`SessionRegistry`]: finds or creates sessions, routes connections
//! - [`TurnSession`]: roster, turn order, and the game itself
//! - [`ConnectionHandler`]: the per-connection receive loop
//! - [`Broadcaster`]: fan-out to every connection in a session
//! - [`TableState`]: lifecycle state machine
//! - [`TableConfig`]: player limits, timeouts, rules
//! - [`NameAssigner`]: how players get their display names

mod broadcast;
mod config;
mod error;
mod handler;
mod naming;
mod registry;
mod table;

pub use broadcast::Broadcaster;
pub use config::{TableConfig, TableState};
pub use error::TableError;
pub use handler::ConnectionHandler;
pub use naming::{NameAssigner, SequentialNames};
pub use registry::SessionRegistry;
pub use table::{AskTurn, DrawOutcome, SeatSummary, TableSnapshot, TurnChange, TurnSession};
