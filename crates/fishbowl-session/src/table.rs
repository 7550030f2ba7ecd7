//! The Turn Session: one Go Fish game and the connections playing it.
//!
//! All mutable game state sits behind a single `tokio::sync::Mutex`. Every
//! operation takes the lock, mutates, snapshots what it needs to tell
//! players, and releases the lock before anything is written to a socket.
//! When a session operation also touches the [`Broadcaster`], it takes the
//! session lock first and the broadcaster's lock second, never the other
//! way around. The turn-notice lock, when needed, comes before both.

use std::sync::Arc;

use fishbowl_engine::{AskOutcome, Card, Deck, GoFish, Rank};
use fishbowl_protocol::{ServerEvent, SessionId, UserId};
use fishbowl_transport::{Connection, ConnectionId};
use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};

use crate::naming::unique_name;
use crate::{
    Broadcaster, ConnectionHandler, NameAssigner, SequentialNames, TableConfig, TableError,
    TableState,
};

/// Where the turn went after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnChange {
    /// Play continues with this player.
    Next(String),
    /// The action ended the game.
    Finished { winners: Vec<String> },
}

/// A successful `draw_card`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawOutcome {
    pub card: Card,
    pub turn: TurnChange,
}

/// A definite `ask_for_card` result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskTurn {
    pub outcome: AskOutcome,
    pub turn: TurnChange,
}

/// Read-only view of one seated player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatSummary {
    pub name: String,
    pub hand_size: usize,
    pub books: u32,
    pub connected: bool,
}

/// Read-only view of a session, for logging and introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSnapshot {
    pub session_id: SessionId,
    pub state: TableState,
    pub players: Vec<SeatSummary>,
    pub current_player: Option<String>,
    pub deck_len: usize,
    pub winners: Option<Vec<String>>,
}

struct Seat<C: Connection> {
    conn_id: ConnectionId,
    handler: Arc<ConnectionHandler<C>>,
}

struct TableInner<C: Connection> {
    state: TableState,
    /// Live handlers in admission order.
    seats: Vec<Seat<C>>,
    game: Option<GoFish>,
    winners: Option<Vec<String>>,
}

/// One game session.
///
/// Always held in an `Arc`: handlers point back at their session with a
/// `Weak`, and [`admit`](Self::admit) / [`start_game`](Self::start_game)
/// need the `Arc` to hand that out.
pub struct TurnSession<C: Connection> {
    id: SessionId,
    config: TableConfig,
    names: Arc<dyn NameAssigner>,
    inner: Mutex<TableInner<C>>,
    notices: Mutex<()>,
    broadcaster: Broadcaster<C>,
}

impl<C: Connection> TurnSession<C> {
    pub fn new(id: SessionId, config: TableConfig) -> Arc<Self> {
        Self::with_names(id, config, Arc::new(SequentialNames))
    }

    pub fn with_names(
        id: SessionId,
        config: TableConfig,
        names: Arc<dyn NameAssigner>,
    ) -> Arc<Self> {
        tracing::info!(session_id = %id, "session created");
        Arc::new(Self {
            id,
            config,
            names,
            inner: Mutex::new(TableInner {
                state: TableState::Lobby,
                seats: Vec::new(),
                game: None,
                winners: None,
            }),
            notices: Mutex::new(()),
            broadcaster: Broadcaster::new(),
        })
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn broadcaster(&self) -> &Broadcaster<C> {
        &self.broadcaster
    }

    // -- Membership -------------------------------------------------------

    /// Seats `conn` under a fresh player name and wires it into the
    /// broadcaster.
    ///
    /// # Errors
    /// [`TableError::NotJoinable`] once the game has started,
    /// [`TableError::Full`] at `max_players`.
    pub async fn admit(
        self: &Arc<Self>,
        conn: Arc<C>,
        user: UserId,
    ) -> Result<Arc<ConnectionHandler<C>>, TableError> {
        let mut inner = self.inner.lock().await;
        if !inner.state.is_joinable() {
            return Err(TableError::NotJoinable(inner.state));
        }
        if inner.seats.len() >= self.config.max_players {
            return Err(TableError::Full(inner.seats.len()));
        }

        let taken: Vec<&str> = inner.seats.iter().map(|s| s.handler.player()).collect();
        let player = unique_name(self.names.as_ref(), inner.seats.len() + 1, &taken);

        let handler = Arc::new(ConnectionHandler::new(
            Arc::clone(&conn),
            Arc::downgrade(self),
            player,
            user,
            self.config.recv_timeout,
        ));
        let conn_id = conn.id();
        inner.seats.push(Seat {
            conn_id,
            handler: Arc::clone(&handler),
        });
        self.broadcaster.subscribe(conn).await;
        self.broadcaster.register_handler(Arc::clone(&handler)).await;

        tracing::info!(
            session_id = %self.id,
            %conn_id,
            player = handler.player(),
            user = %handler.user(),
            "player admitted"
        );
        Ok(handler)
    }

    /// Forgets the handler for `conn_id`. Calling it again is a no-op.
    ///
    /// A player evicted after the deal keeps their seat in the game; only
    /// the connection goes away.
    pub async fn evict(&self, conn_id: ConnectionId) {
        let mut inner = self.inner.lock().await;
        let Some(pos) = inner.seats.iter().position(|s| s.conn_id == conn_id) else {
            return;
        };
        let seat = inner.seats.remove(pos);
        self.broadcaster.unsubscribe(conn_id).await;
        self.broadcaster.unregister_handler(conn_id).await;
        tracing::info!(
            session_id = %self.id,
            %conn_id,
            player = seat.handler.player(),
            "handler evicted"
        );
    }

    /// Live handlers.
    pub async fn handler_count(&self) -> usize {
        self.inner.lock().await.seats.len()
    }

    // -- Lifecycle --------------------------------------------------------

    /// Deals a fresh deck and starts play. See [`start_game_with`].
    ///
    /// [`start_game_with`]: Self::start_game_with
    pub async fn start_game(self: &Arc<Self>) -> bool {
        self.start_game_with(self.config.deck()).await
    }

    /// Starts the game on `deck`. Runs at most once per session: returns
    /// `false` (and sends nothing) if the game already started or no one
    /// is seated.
    ///
    /// The roster is fixed to the seated players in admission order. Each
    /// player gets `start_game`, then their `initial_hand`; then everyone
    /// gets a turn notification and the player list.
    pub async fn start_game_with(self: &Arc<Self>, deck: Deck) -> bool {
        self.begin(deck, false).await
    }

    /// The ready gate: starts the game only if every seated handler is
    /// ready and at least `min_players` are seated. The check and the deal
    /// happen under the same lock, so a connection admitted mid-check is
    /// never dealt in unready.
    pub async fn start_if_all_ready(self: &Arc<Self>) -> bool {
        self.begin(self.config.deck(), true).await
    }

    async fn begin(self: &Arc<Self>, deck: Deck, require_ready: bool) -> bool {
        let notices = self.notices.lock().await;
        let (dealt, current, names) = {
            let mut inner = self.inner.lock().await;
            if inner.state != TableState::Lobby || inner.seats.is_empty() {
                return false;
            }
            if require_ready {
                let ready = inner.seats.iter().filter(|s| s.handler.is_ready()).count();
                tracing::debug!(
                    session_id = %self.id,
                    ready,
                    total = inner.seats.len(),
                    "checking ready gate"
                );
                if ready < inner.seats.len() || ready < self.config.min_players {
                    return false;
                }
            }

            let names: Vec<String> =
                inner.seats.iter().map(|s| s.handler.player().to_string()).collect();
            let game = match GoFish::deal(names.iter().cloned(), deck, self.config.rules) {
                Ok(game) => game,
                Err(e) => {
                    tracing::error!(session_id = %self.id, error = %e, "deal failed");
                    return false;
                }
            };

            let dealt: Vec<(Arc<ConnectionHandler<C>>, Vec<Card>)> = inner
                .seats
                .iter()
                .map(|s| {
                    let hand = game
                        .player(s.handler.player())
                        .map(|p| p.hand().to_vec())
                        .unwrap_or_default();
                    (Arc::clone(&s.handler), hand)
                })
                .collect();
            let current = game.current_player().to_string();
            tracing::info!(
                session_id = %self.id,
                players = names.len(),
                hand_size = game.rules().initial_hand_size(names.len()),
                first = %current,
                "game started"
            );

            if !self.transition(&mut inner, TableState::Starting) {
                return false;
            }
            inner.game = Some(game);
            (dealt, current, names)
        };

        let message = format!("The game has started with {} players!", names.len());
        for (handler, _) in &dealt {
            handler
                .deliver(ServerEvent::StartGame {
                    message: message.clone(),
                })
                .await;
        }
        for (handler, hand) in dealt {
            if let Err(e) = handler.send_initial_hand(hand).await {
                tracing::warn!(
                    session_id = %self.id,
                    player = handler.player(),
                    error = %e,
                    "failed to send initial hand"
                );
            }
        }
        self.broadcaster.notify_turn(&current).await;

        {
            let mut inner = self.inner.lock().await;
            self.transition(&mut inner, TableState::InProgress);
        }
        self.broadcaster
            .publish(ServerEvent::UpdatePlayerList {
                player_names: names,
            })
            .await;
        drop(notices);
        true
    }

    /// Held while an action's reply and the turn notices it causes go out,
    /// so notices reach every client in the order the turns happened.
    /// Taken before the session lock, never while holding it.
    pub(crate) async fn notices(&self) -> MutexGuard<'_, ()> {
        self.notices.lock().await
    }

    fn transition(&self, inner: &mut TableInner<C>, target: TableState) -> bool {
        if !inner.state.can_transition_to(target) {
            tracing::error!(session_id = %self.id, from = %inner.state, to = %target, "invalid state transition");
            return false;
        }
        tracing::debug!(session_id = %self.id, from = %inner.state, to = %target, "state changed");
        inner.state = target;
        true
    }

    /// Asks every live handler to stop. Their loops exit at the next poll
    /// and evict themselves.
    pub async fn stop(&self) {
        let handlers: Vec<Arc<ConnectionHandler<C>>> = {
            let inner = self.inner.lock().await;
            inner.seats.iter().map(|s| Arc::clone(&s.handler)).collect()
        };
        tracing::info!(session_id = %self.id, handlers = handlers.len(), "stopping session");
        for handler in handlers {
            handler.stop();
        }
    }

    // -- Turns ------------------------------------------------------------

    /// Moves the turn to the next seat and returns who's up.
    pub async fn advance_turn(&self) -> Result<String, TableError> {
        let mut inner = self.inner.lock().await;
        let game = Self::active_game(&mut inner)?;
        Ok(game.advance_turn().to_string())
    }

    /// Whether `player` may act right now. False outside a running game.
    pub async fn is_current_turn(&self, player: &str) -> bool {
        let inner = self.inner.lock().await;
        inner.state.is_active()
            && inner
                .game
                .as_ref()
                .is_some_and(|game| game.is_current_turn(player))
    }

    /// `player` draws a card, and the turn moves on.
    ///
    /// # Errors
    /// [`TableError::NotYourTurn`] out of turn, [`TableError::DeckEmpty`]
    /// with nothing to draw (the turn stays put).
    pub async fn draw(&self, player: &str) -> Result<DrawOutcome, TableError> {
        let mut inner = self.inner.lock().await;
        let game = Self::active_game(&mut inner)?;
        Self::check_turn(game, player)?;

        let card = game.draw(player)?.ok_or(TableError::DeckEmpty)?;
        let turn = self.end_turn(&mut inner);
        Ok(DrawOutcome { card, turn })
    }

    /// `asker` asks `target` for `rank`, and the turn moves on.
    ///
    /// # Errors
    /// [`TableError::NotYourTurn`] out of turn; an invalid target comes
    /// back as [`TableError::Engine`] and the turn stays put.
    pub async fn ask(&self, asker: &str, target: &str, rank: Rank) -> Result<AskTurn, TableError> {
        let mut inner = self.inner.lock().await;
        let game = Self::active_game(&mut inner)?;
        Self::check_turn(game, asker)?;

        let outcome = game.ask_for_card(asker, target, rank)?;
        tracing::debug!(session_id = %self.id, asker, target, %rank, summary = %outcome.summary, "ask resolved");
        let turn = self.end_turn(&mut inner);
        Ok(AskTurn { outcome, turn })
    }

    /// Tells everyone where the turn went: a turn notification, or the
    /// final result.
    pub async fn announce(&self, turn: &TurnChange) {
        match turn {
            TurnChange::Next(player) => self.broadcaster.notify_turn(player).await,
            TurnChange::Finished { winners } => {
                self.broadcaster
                    .publish(ServerEvent::game_over(winners.clone()))
                    .await
            }
        }
    }

    fn active_game(inner: &mut TableInner<C>) -> Result<&mut GoFish, TableError> {
        if inner.state == TableState::Finished {
            return Err(TableError::GameOver);
        }
        if !inner.state.is_active() {
            return Err(TableError::NotStarted);
        }
        inner.game.as_mut().ok_or(TableError::NotStarted)
    }

    fn check_turn(game: &GoFish, player: &str) -> Result<(), TableError> {
        if game.is_current_turn(player) {
            Ok(())
        } else {
            Err(TableError::NotYourTurn {
                current: game.current_player().to_string(),
            })
        }
    }

    /// Advances the turn, then finishes the game if it's over.
    fn end_turn(&self, inner: &mut TableInner<C>) -> TurnChange {
        let Some(game) = inner.game.as_mut() else {
            return TurnChange::Finished {
                winners: Vec::new(),
            };
        };

        let next = game.advance_turn().to_string();
        if game.is_game_over() {
            let winners = game.check_game_end().unwrap_or_else(|| game.leaders());
            tracing::info!(session_id = %self.id, ?winners, "game finished");
            self.transition(inner, TableState::Finished);
            inner.winners = Some(winners.clone());
            return TurnChange::Finished { winners };
        }

        tracing::debug!(session_id = %self.id, player = %next, "turn advanced");
        TurnChange::Next(next)
    }

    // -- Introspection ----------------------------------------------------

    pub async fn state(&self) -> TableState {
        self.inner.lock().await.state
    }

    /// Names in seat order: the live lobby before the deal, the fixed
    /// roster after.
    pub async fn player_names(&self) -> Vec<String> {
        let inner = self.inner.lock().await;
        match &inner.game {
            Some(game) => game.player_names(),
            None => inner
                .seats
                .iter()
                .map(|s| s.handler.player().to_string())
                .collect(),
        }
    }

    /// A copy of `player`'s hand, if the game has started and they're in it.
    pub async fn hand_of(&self, player: &str) -> Option<Vec<Card>> {
        let inner = self.inner.lock().await;
        let game = inner.game.as_ref()?;
        game.player(player).map(|p| p.hand().to_vec())
    }

    pub async fn snapshot(&self) -> TableSnapshot {
        let inner = self.inner.lock().await;
        let connected = |name: &str| inner.seats.iter().any(|s| s.handler.player() == name);

        let (players, current_player, deck_len) = match &inner.game {
            Some(game) => (
                game.players()
                    .iter()
                    .map(|p| SeatSummary {
                        name: p.name().to_string(),
                        hand_size: p.hand().len(),
                        books: p.books(),
                        connected: connected(p.name()),
                    })
                    .collect(),
                (inner.state != TableState::Finished)
                    .then(|| game.current_player().to_string()),
                game.deck_len(),
            ),
            None => (
                inner
                    .seats
                    .iter()
                    .map(|s| SeatSummary {
                        name: s.handler.player().to_string(),
                        hand_size: 0,
                        books: 0,
                        connected: true,
                    })
                    .collect(),
                None,
                0,
            ),
        };

        TableSnapshot {
            session_id: self.id.clone(),
            state: inner.state,
            players,
            current_player,
            deck_len,
            winners: inner.winners.clone(),
        }
    }
}
