//! A seat at the table: name, hand, and completed books.

use serde::Serialize;

use crate::{Card, Rank};

/// Cards of one rank that make a book.
pub const BOOK_SIZE: usize = 4;

/// One player's hand and score.
#[derive(Debug, Clone, Serialize)]
pub struct Player {
    name: String,
    hand: Vec<Card>,
    books: u32,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hand: Vec::new(),
            books: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cards currently held, in the order they arrived.
    pub fn hand(&self) -> &[Card] {
        &self.hand
    }

    /// Number of completed books.
    pub fn books(&self) -> u32 {
        self.books
    }

    pub fn has_rank(&self, rank: Rank) -> bool {
        self.hand.iter().any(|card| card.rank == rank)
    }

    pub fn count_rank(&self, rank: Rank) -> usize {
        self.hand.iter().filter(|card| card.rank == rank).count()
    }

    /// Adds cards to the hand, then converts any completed set of four into
    /// a book. Returns the ranks that were booked by this call.
    pub fn receive(&mut self, cards: impl IntoIterator<Item = Card>) -> Vec<Rank> {
        self.hand.extend(cards);
        self.collect_books()
    }

    /// Removes every card of `rank` from the hand and returns them.
    pub(crate) fn give_all(&mut self, rank: Rank) -> Vec<Card> {
        let (given, kept): (Vec<Card>, Vec<Card>) =
            self.hand.drain(..).partition(|card| card.rank == rank);
        self.hand = kept;
        given
    }

    fn collect_books(&mut self) -> Vec<Rank> {
        let booked: Vec<Rank> = Rank::ALL
            .into_iter()
            .filter(|rank| self.count_rank(*rank) == BOOK_SIZE)
            .collect();
        if booked.is_empty() {
            return booked;
        }

        self.hand.retain(|card| !booked.contains(&card.rank));
        self.books += booked.len() as u32;
        tracing::debug!(player = %self.name, ?booked, books = self.books, "books completed");
        booked
    }
}
