//! The Go Fish table: seated players, the draw pile, and the turn pointer.
//!
//! `GoFish` is pure game state. It never decides *when* a turn ends; the
//! session layer calls [`GoFish::advance_turn`] after each definite action.

use crate::player::BOOK_SIZE;
use crate::{Card, Deck, EngineError, GameOverPolicy, Player, Rank, Rules};

/// What happened on an ask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AskResult {
    /// The target handed over every card of the rank.
    Transferred { cards: Vec<Card> },
    /// The target had none, and the asker drew the rank they asked for.
    LuckyDraw { card: Card },
    /// The target had none, and the draw missed (or the deck was empty).
    GoFish { drawn: Option<Card> },
}

/// Result of [`GoFish::ask_for_card`] plus a line of text for the players.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskOutcome {
    pub result: AskResult,
    pub summary: String,
}

impl AskOutcome {
    /// `true` only when the target handed cards over.
    pub fn is_success(&self) -> bool {
        matches!(self.result, AskResult::Transferred { .. })
    }

    /// Cards the asker gained from the ask itself. A missed go-fish draw
    /// is not counted here.
    pub fn new_cards(&self) -> Vec<Card> {
        match &self.result {
            AskResult::Transferred { cards } => cards.clone(),
            AskResult::LuckyDraw { card } => vec![*card],
            AskResult::GoFish { .. } => Vec::new(),
        }
    }

    /// The card drawn from the deck, if the ask went to the deck.
    pub fn drawn(&self) -> Option<Card> {
        match &self.result {
            AskResult::Transferred { .. } => None,
            AskResult::LuckyDraw { card } => Some(*card),
            AskResult::GoFish { drawn } => *drawn,
        }
    }
}

/// One game of Go Fish.
#[derive(Debug, Clone)]
pub struct GoFish {
    players: Vec<Player>,
    deck: Deck,
    turn: usize,
    rules: Rules,
}

impl GoFish {
    /// Seats `names` in order around `deck` without dealing.
    ///
    /// # Errors
    /// [`EngineError::EmptyRoster`] with no names,
    /// [`EngineError::DuplicatePlayer`] when a name repeats.
    pub fn new<I, S>(names: I, deck: Deck, rules: Rules) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut players: Vec<Player> = Vec::new();
        for name in names {
            let name = name.into();
            if players.iter().any(|p| p.name() == name) {
                return Err(EngineError::DuplicatePlayer(name));
            }
            players.push(Player::new(name));
        }
        if players.is_empty() {
            return Err(EngineError::EmptyRoster);
        }

        Ok(Self {
            players,
            deck,
            turn: 0,
            rules,
        })
    }

    /// Seats `names` and deals the starting hands from `deck`.
    pub fn deal<I, S>(names: I, deck: Deck, rules: Rules) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut game = Self::new(names, deck, rules)?;
        let per_player = rules.initial_hand_size(game.players.len());
        game.deal_initial(per_player);
        Ok(game)
    }

    /// Deals `per_player` cards to everyone, one card per player per pass.
    /// Stops early if the deck runs out.
    pub fn deal_initial(&mut self, per_player: usize) {
        for _ in 0..per_player {
            for player in &mut self.players {
                let Some(card) = self.deck.draw() else {
                    return;
                };
                player.receive([card]);
            }
        }
    }

    // -- Actions ----------------------------------------------------------

    /// Draws the top card for `player`, then checks their hand for books.
    ///
    /// Returns `Ok(None)` when the deck is already empty.
    pub fn draw(&mut self, player: &str) -> Result<Option<Card>, EngineError> {
        let idx = self.index_of(player)?;
        Ok(self.draw_for(idx))
    }

    /// `asker` asks `target` for every card of `rank`.
    ///
    /// # Errors
    /// [`EngineError::InvalidTarget`] if `target` is not seated or is the
    /// asker. Nothing changes in that case.
    pub fn ask_for_card(
        &mut self,
        asker: &str,
        target: &str,
        rank: Rank,
    ) -> Result<AskOutcome, EngineError> {
        let asker_idx = self.index_of(asker)?;
        let target_idx = match self.position(target) {
            Some(idx) if idx != asker_idx => idx,
            _ => return Err(EngineError::InvalidTarget(target.to_string())),
        };

        if self.players[target_idx].has_rank(rank) {
            let cards = self.players[target_idx].give_all(rank);
            self.players[asker_idx].receive(cards.iter().copied());
            let summary = format!(
                "{asker} got {} cards of {rank} from {target}",
                cards.len()
            );
            return Ok(AskOutcome {
                result: AskResult::Transferred { cards },
                summary,
            });
        }

        let outcome = match self.draw_for(asker_idx) {
            Some(card) if card.rank == rank => AskOutcome {
                result: AskResult::LuckyDraw { card },
                summary: format!("Go Fish! Lucky draw! {asker} got a {rank}."),
            },
            drawn => AskOutcome {
                result: AskResult::GoFish { drawn },
                summary: "Go Fish! No luck this time.".to_string(),
            },
        };
        Ok(outcome)
    }

    fn draw_for(&mut self, idx: usize) -> Option<Card> {
        let card = self.deck.draw()?;
        self.players[idx].receive([card]);
        Some(card)
    }

    // -- Turn pointer -----------------------------------------------------

    /// Name of the player whose action is currently valid.
    pub fn current_player(&self) -> &str {
        self.players[self.turn].name()
    }

    pub fn is_current_turn(&self, player: &str) -> bool {
        self.current_player() == player
    }

    /// Moves the turn to the next seat, wrapping around, and returns the
    /// new current player.
    pub fn advance_turn(&mut self) -> &str {
        self.turn = (self.turn + 1) % self.players.len();
        let next = self.players[self.turn].name();
        tracing::debug!(player = next, "next player's turn");
        next
    }

    // -- End of game ------------------------------------------------------

    /// Whether the game is over under the configured [`GameOverPolicy`].
    /// An empty deck always ends the game.
    pub fn is_game_over(&self) -> bool {
        if self.deck.is_empty() {
            return true;
        }
        match self.rules.game_over {
            GameOverPolicy::AnyPlayerHasBook => self.players.iter().any(|p| p.books() >= 1),
            GameOverPolicy::EveryPlayerHasBook => self.players.iter().all(|p| p.books() >= 1),
            GameOverPolicy::DeckExhausted => false,
        }
    }

    /// Once the deck is exhausted, returns every player tied for the most
    /// books. `None` while cards remain.
    pub fn check_game_end(&self) -> Option<Vec<String>> {
        if self.deck.is_empty() {
            Some(self.leaders())
        } else {
            None
        }
    }

    /// Players tied for the most books right now.
    pub fn leaders(&self) -> Vec<String> {
        let best = self.players.iter().map(Player::books).max().unwrap_or(0);
        self.players
            .iter()
            .filter(|p| p.books() == best)
            .map(|p| p.name().to_string())
            .collect()
    }

    // -- Introspection ----------------------------------------------------

    /// Seated players in roster order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name() == name)
    }

    /// Roster order, as names.
    pub fn player_names(&self) -> Vec<String> {
        self.players.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn deck_len(&self) -> usize {
        self.deck.len()
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Cards accounted for: deck, every hand, and four per book. Always
    /// [`DECK_SIZE`](crate::DECK_SIZE) for a game built on a full deck.
    pub fn card_total(&self) -> usize {
        let in_hands: usize = self.players.iter().map(|p| p.hand().len()).sum();
        let in_books: usize = self.players.iter().map(|p| p.books() as usize).sum();
        self.deck.len() + in_hands + BOOK_SIZE * in_books
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.players.iter().position(|p| p.name() == name)
    }

    fn index_of(&self, name: &str) -> Result<usize, EngineError> {
        self.position(name)
            .ok_or_else(|| EngineError::UnknownPlayer(name.to_string()))
    }
}
