//! Go Fish rules for Fishbowl.
//!
//! This crate is pure game state with no I/O and no locking. The session
//! layer owns one [`GoFish`] per game and serializes access to it.
//!
//! # Key types
//!
//! - [`Card`], [`Rank`], [`Suit`]: immutable card values
//! - [`Deck`]: the 52-card draw pile
//! - [`Player`]: a hand plus completed books
//! - [`GoFish`]: the table: players, deck, turn pointer, and the rules
//! - [`Rules`] / [`GameOverPolicy`]: deal sizes and end-of-game rule

mod card;
mod deck;
mod error;
mod game;
mod player;
mod rules;

pub use card::{Card, Rank, Suit};
pub use deck::{Deck, DECK_SIZE};
pub use error::EngineError;
pub use game::{AskOutcome, AskResult, GoFish};
pub use player::{Player, BOOK_SIZE};
pub use rules::{GameOverPolicy, Rules};
