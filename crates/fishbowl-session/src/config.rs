//! Table configuration and lifecycle state machine.

use std::time::Duration;

use fishbowl_engine::{Deck, Rules};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TableConfig
// ---------------------------------------------------------------------------

/// Settings shared by every session a registry creates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    /// Ready players required before the game starts.
    pub min_players: usize,

    /// Connections a lobby admits before refusing with `Full`.
    pub max_players: usize,

    /// How long a handler waits on one receive before re-checking its
    /// stop flag.
    pub recv_timeout: Duration,

    pub rules: Rules,

    /// Fixed shuffle for every game. `None` shuffles from the OS RNG.
    pub shuffle_seed: Option<u64>,
}

impl TableConfig {
    /// A fresh deck for a new game.
    pub fn deck(&self) -> Deck {
        match self.shuffle_seed {
            Some(seed) => Deck::seeded(seed),
            None => Deck::shuffled(),
        }
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            min_players: 1,
            max_players: 10,
            recv_timeout: Duration::from_millis(250),
            rules: Rules::default(),
            shuffle_seed: None,
        }
    }
}

// ---------------------------------------------------------------------------
// TableState
// ---------------------------------------------------------------------------

/// The lifecycle state of a session.
///
/// Transitions are strictly ordered and never go back:
///
/// ```text
/// Lobby → Starting → InProgress → Finished
/// ```
///
/// - **Lobby**: admitting connections, waiting for everyone to be ready.
/// - **Starting**: cards dealt, roster fixed, start messages going out.
///   Nobody can join, and no turn has been announced yet.
/// - **InProgress**: turns enforced.
/// - **Finished**: winners decided. Game actions are refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableState {
    Lobby,
    Starting,
    InProgress,
    Finished,
}

impl TableState {
    /// Returns `true` if the session is admitting connections.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Lobby)
    }

    /// Returns `true` while turns are being played.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::InProgress)
    }

    /// The state after this one, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Lobby => Some(Self::Starting),
            Self::Starting => Some(Self::InProgress),
            Self::InProgress => Some(Self::Finished),
            Self::Finished => None,
        }
    }

    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl std::fmt::Display for TableState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lobby => write!(f, "Lobby"),
            Self::Starting => write!(f, "Starting"),
            Self::InProgress => write!(f, "InProgress"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}
