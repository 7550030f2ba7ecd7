//! Tunable rule parameters.

use serde::{Deserialize, Serialize};

/// When a game counts as finished, on top of the deck running out.
///
/// The shipped rule ends the game as soon as anyone completes a single
/// book, which cuts most games short. It stays the default so existing
/// clients see the same behavior; the stricter variants are here so
/// deployments and tests can pick a different rule explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverPolicy {
    /// Over once any player holds at least one book.
    #[default]
    AnyPlayerHasBook,
    /// Over once every player holds at least one book.
    EveryPlayerHasBook,
    /// Over only when the deck is exhausted.
    DeckExhausted,
}

/// Deal sizes and the end-of-game rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rules {
    /// Largest table that still gets the bigger starting hand.
    pub small_table_max: usize,
    /// Cards dealt to each player at a small table.
    pub small_table_hand: usize,
    /// Cards dealt to each player at a larger table.
    pub large_table_hand: usize,
    pub game_over: GameOverPolicy,
}

impl Rules {
    /// Cards each player is dealt for a table of `players`.
    pub fn initial_hand_size(&self, players: usize) -> usize {
        if players <= self.small_table_max {
            self.small_table_hand
        } else {
            self.large_table_hand
        }
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            small_table_max: 3,
            small_table_hand: 7,
            large_table_hand: 5,
            game_over: GameOverPolicy::default(),
        }
    }
}
