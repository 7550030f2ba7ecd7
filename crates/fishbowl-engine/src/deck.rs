//! The 52-card draw pile.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::{Card, Rank, Suit};

/// Number of cards in a full deck.
pub const DECK_SIZE: usize = 52;

/// An ordered pile of cards. The top of the pile is the end of the vector,
/// so drawing is a `pop`.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// A full deck in rank-major order (`2♥ 2♦ 2♣ 2♠ 3♥ …`), bottom first.
    pub fn ordered() -> Self {
        let cards = Rank::ALL
            .into_iter()
            .flat_map(|rank| Suit::ALL.into_iter().map(move |suit| Card::new(rank, suit)))
            .collect();
        Self { cards }
    }

    /// A full deck shuffled with the thread-local RNG.
    pub fn shuffled() -> Self {
        Self::shuffled_with(&mut rand::rng())
    }

    /// A full deck shuffled with a caller-supplied RNG.
    pub fn shuffled_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Self::ordered();
        deck.cards.shuffle(rng);
        deck
    }

    /// A full deck whose order is fixed by `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self::shuffled_with(&mut StdRng::seed_from_u64(seed))
    }

    /// A full deck with `top` drawn first, in the order given, followed by
    /// every remaining card in [`ordered`](Self::ordered) order.
    ///
    /// Duplicates in `top` are ignored after their first occurrence so the
    /// result is always a proper 52-card deck.
    pub fn stacked(top: &[Card]) -> Self {
        let mut head: Vec<Card> = Vec::with_capacity(top.len());
        for card in top {
            if !head.contains(card) {
                head.push(*card);
            }
        }

        let mut cards: Vec<Card> = Self::ordered()
            .cards
            .into_iter()
            .filter(|card| !head.contains(card))
            .collect();
        // The first element of `top` must end up last so it is popped first.
        cards.extend(head.into_iter().rev());
        Self { cards }
    }

    /// Removes and returns the top card, or `None` if the deck is empty.
    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    /// Number of cards left.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// The card that would be drawn next.
    pub fn peek(&self) -> Option<&Card> {
        self.cards.last()
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::shuffled()
    }
}
