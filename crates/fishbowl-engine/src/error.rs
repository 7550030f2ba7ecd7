//! Error types for the card engine.

/// Errors raised by the Go Fish rules.
///
/// None of these mutate state: when an engine call returns `Err`, the deck
/// and every hand are exactly as they were before the call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// No player with this name is seated.
    #[error("unknown player '{0}'")]
    UnknownPlayer(String),

    /// The ask named a player who doesn't exist or named the asker.
    #[error("invalid target player '{0}'")]
    InvalidTarget(String),

    /// Two seats were given the same name.
    #[error("duplicate player name '{0}'")]
    DuplicatePlayer(String),

    /// A game needs at least one player.
    #[error("cannot start a game with no players")]
    EmptyRoster,

    /// A rank symbol outside `2-10, J, Q, K, A`.
    #[error("unknown rank '{0}'")]
    UnknownRank(String),

    /// A suit name outside Hearts, Diamonds, Clubs, Spades.
    #[error("unknown suit '{0}'")]
    UnknownSuit(String),
}
