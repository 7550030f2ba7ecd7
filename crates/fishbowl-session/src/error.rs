//! Error types for the session layer.

use fishbowl_engine::EngineError;
use fishbowl_protocol::ProtocolError;
use fishbowl_transport::TransportError;

use crate::TableState;

/// Errors that can occur during session operations.
///
/// Everything except `Transport` is a rule or request problem: the handler
/// turns it into a reply and keeps the connection open.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// Admission outside the lobby.
    #[error("session is not accepting players (state: {0})")]
    NotJoinable(TableState),

    /// Admission at `max_players`.
    #[error("session is full ({0} players)")]
    Full(usize),

    /// A game action before the game started.
    #[error("the game has not started yet")]
    NotStarted,

    /// A game action after the game finished.
    #[error("the game is over")]
    GameOver,

    /// A game action out of turn.
    #[error("it's not your turn, it's {current}'s turn")]
    NotYourTurn { current: String },

    /// `draw_card` with nothing left to draw.
    #[error("the deck is empty")]
    DeckEmpty,

    /// The session was dropped while a handler still pointed at it.
    #[error("session closed")]
    SessionClosed,

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
