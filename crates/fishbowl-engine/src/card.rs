//! Playing cards: [`Rank`], [`Suit`], and [`Card`].
//!
//! On the wire a card is `{"rank": "K", "suit": "Hearts"}`. The serde
//! renames below pin those exact symbols so clients never see Rust
//! variant names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::EngineError;

// ---------------------------------------------------------------------------
// Rank
// ---------------------------------------------------------------------------

/// One of the 13 card ranks.
///
/// Ordering follows the deck (`2` lowest, `A` highest). Go Fish doesn't
/// rank cards against each other, but a stable order keeps hands and test
/// output readable.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Rank {
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "5")]
    Five,
    #[serde(rename = "6")]
    Six,
    #[serde(rename = "7")]
    Seven,
    #[serde(rename = "8")]
    Eight,
    #[serde(rename = "9")]
    Nine,
    #[serde(rename = "10")]
    Ten,
    #[serde(rename = "J")]
    Jack,
    #[serde(rename = "Q")]
    Queen,
    #[serde(rename = "K")]
    King,
    #[serde(rename = "A")]
    Ace,
}

impl Rank {
    /// All ranks in deck order.
    pub const ALL: [Rank; 13] = [
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    /// The wire symbol for this rank.
    pub fn symbol(self) -> &'static str {
        match self {
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Rank {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Rank::ALL
            .into_iter()
            .find(|rank| rank.symbol().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| EngineError::UnknownRank(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Suit
// ---------------------------------------------------------------------------

/// One of the four suits.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Suit {
    Hearts,
    Diamonds,
    Clubs,
    Spades,
}

impl Suit {
    /// All suits in deck order.
    pub const ALL: [Suit; 4] = [Suit::Hearts, Suit::Diamonds, Suit::Clubs, Suit::Spades];

    /// The wire name for this suit.
    pub fn name(self) -> &'static str {
        match self {
            Suit::Hearts => "Hearts",
            Suit::Diamonds => "Diamonds",
            Suit::Clubs => "Clubs",
            Suit::Spades => "Spades",
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Suit {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Suit::ALL
            .into_iter()
            .find(|suit| suit.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| EngineError::UnknownSuit(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Card
// ---------------------------------------------------------------------------

/// A single playing card. Immutable and `Copy`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {}", self.rank, self.suit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_from_str_accepts_wire_symbols() {
        for rank in Rank::ALL {
            assert_eq!(rank.symbol().parse::<Rank>().unwrap(), rank);
        }
        assert_eq!("k".parse::<Rank>().unwrap(), Rank::King);
        assert_eq!(" 10 ".parse::<Rank>().unwrap(), Rank::Ten);
    }

    #[test]
    fn test_rank_from_str_rejects_unknown() {
        assert!(matches!(
            "1".parse::<Rank>(),
            Err(EngineError::UnknownRank(s)) if s == "1"
        ));
        assert!("King".parse::<Rank>().is_err());
    }

    #[test]
    fn test_suit_from_str() {
        assert_eq!("spades".parse::<Suit>().unwrap(), Suit::Spades);
        assert!("Stars".parse::<Suit>().is_err());
    }

    #[test]
    fn test_card_json_shape() {
        let card = Card::new(Rank::Ten, Suit::Hearts);
        let json = serde_json::to_value(card).unwrap();
        assert_eq!(json, serde_json::json!({"rank": "10", "suit": "Hearts"}));

        let back: Card = serde_json::from_value(json).unwrap();
        assert_eq!(back, card);
    }

    #[test]
    fn test_card_display() {
        assert_eq!(Card::new(Rank::Queen, Suit::Clubs).to_string(), "Q of Clubs");
    }
}
