//! Integration tests for sessions, handlers, and the registry, driven over
//! in-memory connections.

use std::sync::Arc;
use std::time::Duration;

use fishbowl_engine::{Card, Deck, GameOverPolicy, Rank, Rules, Suit};
use fishbowl_protocol::{SessionId, UserId};
use fishbowl_session::{
    ConnectionHandler, SessionRegistry, TableConfig, TableError, TableState, TurnSession,
};
use fishbowl_transport::{Connection, MemoryConnection, MemoryPeer};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

type Table = TurnSession<MemoryConnection>;
type Handler = ConnectionHandler<MemoryConnection>;

// =========================================================================
// Helpers
// =========================================================================

fn config() -> TableConfig {
    TableConfig {
        recv_timeout: Duration::from_millis(20),
        ..TableConfig::default()
    }
}

fn gid(s: &str) -> SessionId {
    SessionId::from(s)
}

fn c(rank: Rank, suit: Suit) -> Card {
    Card::new(rank, suit)
}

async fn seat(session: &Arc<Table>) -> (Arc<Handler>, MemoryPeer) {
    let (conn, peer) = MemoryConnection::pair();
    let handler = session
        .admit(Arc::new(conn), UserId::from("tester"))
        .await
        .unwrap();
    (handler, peer)
}

fn spawn_run(handler: Arc<Handler>) -> JoinHandle<()> {
    tokio::spawn(async move { handler.run().await })
}

async fn next_json(peer: &mut MemoryPeer) -> Value {
    let bytes = tokio::time::timeout(Duration::from_secs(2), peer.recv())
        .await
        .expect("timed out waiting for a message")
        .expect("connection closed");
    serde_json::from_slice(&bytes).unwrap()
}

/// Reads the four messages every player gets when the game starts.
async fn take_start(peer: &mut MemoryPeer) -> Vec<Value> {
    let mut msgs = Vec::new();
    for _ in 0..4 {
        msgs.push(next_json(peer).await);
    }
    msgs
}

fn send(peer: &MemoryPeer, value: Value) {
    peer.send(serde_json::to_vec(&value).unwrap()).unwrap();
}

async fn join(task: JoinHandle<()>) {
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("handler did not exit")
        .unwrap();
}

/// Deals `a` to Player 1 and `b` to Player 2 (seven each), with `rest` on
/// top of the remaining deck.
fn deck_for(a: [Card; 7], b: [Card; 7], rest: &[Card]) -> Deck {
    let mut top: Vec<Card> = a.into_iter().zip(b).flat_map(|(x, y)| [x, y]).collect();
    top.extend_from_slice(rest);
    Deck::stacked(&top)
}

fn hearts(ranks: [Rank; 5]) -> [Card; 5] {
    ranks.map(|r| c(r, Suit::Hearts))
}

/// Player 1: K♥ and 2-7♥. Player 2: K♦ K♣ and 8-Q♥.
fn two_kings_deck(rest: &[Card]) -> Deck {
    let [a2, a3, a4, a5, a6] = hearts([Rank::Two, Rank::Three, Rank::Four, Rank::Five, Rank::Six]);
    let [b8, b9, b10, bj, bq] =
        hearts([Rank::Eight, Rank::Nine, Rank::Ten, Rank::Jack, Rank::Queen]);
    deck_for(
        [c(Rank::King, Suit::Hearts), a2, a3, a4, a5, a6, c(Rank::Seven, Suit::Hearts)],
        [c(Rank::King, Suit::Diamonds), c(Rank::King, Suit::Clubs), b8, b9, b10, bj, bq],
        rest,
    )
}

/// Two players seated, game started on `deck`, start messages consumed,
/// handler loops running.
async fn started(
    deck: Deck,
) -> (Arc<Table>, MemoryPeer, MemoryPeer, JoinHandle<()>, JoinHandle<()>) {
    let session = Table::new(gid("g"), config());
    let (h1, mut p1) = seat(&session).await;
    let (h2, mut p2) = seat(&session).await;
    assert!(session.start_game_with(deck).await);
    take_start(&mut p1).await;
    take_start(&mut p2).await;
    (session, p1, p2, spawn_run(h1), spawn_run(h2))
}

// =========================================================================
// Admission
// =========================================================================

#[tokio::test]
async fn test_admit_assigns_sequential_names() {
    let session = Table::new(gid("g"), config());
    let (h1, _p1) = seat(&session).await;
    let (h2, _p2) = seat(&session).await;

    assert_eq!(h1.player(), "Player 1");
    assert_eq!(h2.player(), "Player 2");
    assert_eq!(session.player_names().await, vec!["Player 1", "Player 2"]);
    assert_eq!(session.broadcaster().subscriber_count().await, 2);
    assert_eq!(session.broadcaster().handlers().await.len(), 2);
}

#[tokio::test]
async fn test_admit_skips_name_still_in_use() {
    let session = Table::new(gid("g"), config());
    let (h1, _p1) = seat(&session).await;
    let (_h2, _p2) = seat(&session).await;

    session.evict(h1.conn_id()).await;
    let (h3, _p3) = seat(&session).await;

    assert_eq!(h3.player(), "Player 3");
}

#[tokio::test]
async fn test_admit_full_session_is_refused() {
    let session = Table::new(
        gid("g"),
        TableConfig {
            max_players: 2,
            ..config()
        },
    );
    let _a = seat(&session).await;
    let _b = seat(&session).await;

    let (conn, _peer) = MemoryConnection::pair();
    let result = session.admit(Arc::new(conn), UserId::from("late")).await;

    assert!(matches!(result, Err(TableError::Full(2))));
}

#[tokio::test]
async fn test_admit_after_start_is_refused() {
    let session = Table::new(gid("g"), config());
    let _a = seat(&session).await;
    assert!(session.start_game().await);

    let (conn, _peer) = MemoryConnection::pair();
    let result = session.admit(Arc::new(conn), UserId::from("late")).await;

    assert!(matches!(
        result,
        Err(TableError::NotJoinable(TableState::InProgress))
    ));
}

#[tokio::test]
async fn test_registry_custom_names() {
    let registry: SessionRegistry<MemoryConnection> =
        SessionRegistry::with_names(config(), |n: usize| format!("Fish {n}"));
    let session = registry.find_or_create(&gid("g")).await;

    let (handler, _peer) = seat(&session).await;

    assert_eq!(handler.player(), "Fish 1");
}

// =========================================================================
// Starting the game
// =========================================================================

#[tokio::test]
async fn test_start_game_sends_start_hand_turn_and_list() {
    let session = Table::new(gid("g"), config());
    let (_h1, mut p1) = seat(&session).await;
    let (_h2, mut p2) = seat(&session).await;

    assert!(session.start_game_with(two_kings_deck(&[])).await);

    let m1 = take_start(&mut p1).await;
    assert_eq!(m1[0]["action"], "start_game");
    assert_eq!(m1[1]["action"], "initial_hand");
    assert_eq!(m1[1]["cards"].as_array().unwrap().len(), 7);
    assert_eq!(m1[2], json!({"action": "your_turn"}));
    assert_eq!(
        m1[3],
        json!({"action": "update_player_list", "playerNames": ["Player 1", "Player 2"]})
    );

    let m2 = take_start(&mut p2).await;
    assert_eq!(m2[2], json!({"action": "wait", "player_turn": "Player 1"}));

    assert_eq!(session.state().await, TableState::InProgress);
    assert!(session.is_current_turn("Player 1").await);
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.deck_len, 52 - 14);
    assert_eq!(snapshot.current_player.as_deref(), Some("Player 1"));
}

#[tokio::test]
async fn test_start_game_runs_at_most_once() {
    let session = Table::new(gid("g"), config());
    let (_h1, mut p1) = seat(&session).await;
    let (_h2, mut p2) = seat(&session).await;

    let (first, second) = tokio::join!(session.start_game(), session.start_game());
    assert!(first ^ second, "exactly one call starts the game");
    assert!(!session.start_game().await);

    for peer in [&mut p1, &mut p2] {
        take_start(peer).await;
        assert!(peer.try_recv().is_none(), "no second deal");
    }
}

#[tokio::test]
async fn test_start_game_with_nobody_seated_does_nothing() {
    let session = Table::new(gid("g"), config());
    assert!(!session.start_game().await);
    assert_eq!(session.state().await, TableState::Lobby);
}

#[tokio::test]
async fn test_ready_gate_waits_for_everyone() {
    let session = Table::new(
        gid("g"),
        TableConfig {
            min_players: 2,
            ..config()
        },
    );
    let (h1, mut p1) = seat(&session).await;
    let (h2, mut p2) = seat(&session).await;
    let t1 = spawn_run(h1);
    let t2 = spawn_run(h2);

    send(&p1, json!({"action": "player_ready"}));
    assert_eq!(next_json(&mut p1).await, json!({"status": "ok"}));
    assert_eq!(session.state().await, TableState::Lobby);

    send(&p2, json!({"command": "player_ready"}));
    assert_eq!(next_json(&mut p2).await, json!({"status": "ok"}));

    let m1 = take_start(&mut p1).await;
    let m2 = take_start(&mut p2).await;
    assert_eq!(m1[0]["action"], "start_game");
    assert_eq!(m2[1]["action"], "initial_hand");
    assert_eq!(session.state().await, TableState::InProgress);

    session.stop().await;
    join(t1).await;
    join(t2).await;
}

#[tokio::test]
async fn test_ready_gate_respects_min_players() {
    let session = Table::new(
        gid("g"),
        TableConfig {
            min_players: 2,
            ..config()
        },
    );
    let (h1, mut p1) = seat(&session).await;
    let t1 = spawn_run(Arc::clone(&h1));

    send(&p1, json!({"action": "player_ready"}));
    assert_eq!(next_json(&mut p1).await, json!({"status": "ok"}));

    assert!(h1.is_ready());
    assert!(!session.broadcaster().check_all_ready(&session).await);
    assert_eq!(session.state().await, TableState::Lobby);
    assert!(p1.try_recv().is_none());

    session.stop().await;
    join(t1).await;
}

#[tokio::test]
async fn test_ready_gate_counts_seats_without_running_handlers() {
    let session = Table::new(gid("g"), config());
    let (h1, mut p1) = seat(&session).await;
    let (h2, mut p2) = seat(&session).await;
    let t1 = spawn_run(h1);

    send(&p1, json!({"action": "player_ready"}));
    assert_eq!(next_json(&mut p1).await, json!({"status": "ok"}));

    // Player 2 is seated but has not readied.
    assert_eq!(session.state().await, TableState::Lobby);
    assert!(!session.start_if_all_ready().await);
    assert!(p1.try_recv().is_none());

    let t2 = spawn_run(h2);
    send(&p2, json!({"action": "player_ready"}));
    assert_eq!(next_json(&mut p2).await, json!({"status": "ok"}));

    assert_eq!(take_start(&mut p1).await[0]["action"], "start_game");
    assert_eq!(take_start(&mut p2).await[0]["action"], "start_game");
    assert_eq!(session.state().await, TableState::InProgress);

    session.stop().await;
    join(t1).await;
    join(t2).await;
}

/// A draw sent the moment the hand arrives must not let the start's own
/// turn notice overtake the one for the move that follows.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_turn_notices_stay_ordered_when_first_move_races_start() {
    for _ in 0..20 {
        let session = Table::new(
            gid("g"),
            TableConfig {
                min_players: 2,
                rules: Rules {
                    game_over: GameOverPolicy::DeckExhausted,
                    ..Rules::default()
                },
                ..config()
            },
        );
        let (h1, mut p1) = seat(&session).await;
        let (h2, mut p2) = seat(&session).await;
        let t1 = spawn_run(h1);
        let t2 = spawn_run(h2);

        send(&p1, json!({"action": "player_ready"}));
        assert_eq!(next_json(&mut p1).await, json!({"status": "ok"}));
        send(&p2, json!({"action": "player_ready"}));

        assert_eq!(next_json(&mut p1).await["action"], "start_game");
        assert_eq!(next_json(&mut p1).await["action"], "initial_hand");
        send(&p1, json!({"action": "draw_card"}));

        let mut seen = Vec::new();
        for _ in 0..6 {
            seen.push(next_json(&mut p2).await);
        }
        assert_eq!(seen[0], json!({"status": "ok"}));
        assert_eq!(seen[1]["action"], "start_game");
        assert_eq!(seen[2]["action"], "initial_hand");
        assert_eq!(seen[3], json!({"action": "wait", "player_turn": "Player 1"}));
        assert_eq!(seen[4]["action"], "update_player_list");
        assert_eq!(seen[5], json!({"action": "your_turn"}));
        assert!(session.is_current_turn("Player 2").await);

        session.stop().await;
        join(t1).await;
        join(t2).await;
    }
}

// =========================================================================
// Turns: draws
// =========================================================================

#[tokio::test]
async fn test_draw_on_turn_replies_card_and_advances() {
    let top = c(Rank::Ace, Suit::Spades);
    let (session, mut p1, mut p2, t1, t2) = started(two_kings_deck(&[top])).await;

    send(&p1, json!({"action": "draw_card"}));

    assert_eq!(next_json(&mut p1).await, json!({"card": {"rank": "A", "suit": "Spades"}}));
    assert_eq!(
        next_json(&mut p1).await,
        json!({"action": "wait", "player_turn": "Player 2"})
    );
    assert_eq!(next_json(&mut p2).await, json!({"action": "your_turn"}));
    assert!(session.is_current_turn("Player 2").await);
    assert_eq!(session.hand_of("Player 1").await.unwrap().len(), 8);

    session.stop().await;
    join(t1).await;
    join(t2).await;
}

/// Scenario D: a draw out of turn changes nothing.
#[tokio::test]
async fn test_draw_out_of_turn_is_rejected() {
    let (session, _p1, mut p2, t1, t2) = started(two_kings_deck(&[])).await;
    let before = session.snapshot().await;
    let hand_before = session.hand_of("Player 2").await;

    send(&p2, json!({"action": "draw_card"}));

    let reply = next_json(&mut p2).await;
    assert!(reply["error"].as_str().unwrap().contains("not your turn"));
    let after = session.snapshot().await;
    assert_eq!(after.deck_len, before.deck_len);
    assert_eq!(after.current_player.as_deref(), Some("Player 1"));
    assert_eq!(session.hand_of("Player 2").await, hand_before);

    session.stop().await;
    join(t1).await;
    join(t2).await;
}

#[tokio::test]
async fn test_draw_before_start_is_error() {
    let session = Table::new(gid("g"), config());
    let _seat = seat(&session).await;
    let result = session.draw("Player 1").await;
    assert!(matches!(result, Err(TableError::NotStarted)));
    assert!(matches!(
        session.advance_turn().await,
        Err(TableError::NotStarted)
    ));
}

#[tokio::test]
async fn test_draw_from_empty_deck_is_error_and_turn_stays() {
    // Two hands of 26 take the whole deck.
    let session = Table::new(
        gid("g"),
        TableConfig {
            rules: Rules {
                small_table_hand: 26,
                ..Rules::default()
            },
            ..config()
        },
    );
    let (h1, mut p1) = seat(&session).await;
    let (h2, mut p2) = seat(&session).await;
    assert!(session.start_game().await);
    take_start(&mut p1).await;
    take_start(&mut p2).await;
    assert_eq!(session.snapshot().await.deck_len, 0);
    let t1 = spawn_run(h1);
    let t2 = spawn_run(h2);

    send(&p1, json!({"action": "draw_card"}));
    assert_eq!(next_json(&mut p1).await, json!({"error": "the deck is empty"}));

    assert!(session.is_current_turn("Player 1").await);
    assert_eq!(session.state().await, TableState::InProgress);
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.deck_len, 0);
    assert_eq!(snapshot.current_player.as_deref(), Some("Player 1"));
    assert!(p2.try_recv().is_none());

    session.stop().await;
    join(t1).await;
    join(t2).await;
}

// =========================================================================
// Turns: asks
// =========================================================================

/// Scenario B over the wire.
#[tokio::test]
async fn test_ask_success_transfers_and_advances() {
    let (session, mut p1, mut p2, t1, t2) = started(two_kings_deck(&[])).await;

    send(
        &p1,
        json!({"action": "ask_for_card", "targetPlayerName": "Player 2", "rank": "K"}),
    );

    let reply = next_json(&mut p1).await;
    assert_eq!(reply["action"], "ask_response");
    assert_eq!(reply["result"], "success");
    assert_eq!(reply["cardsReceived"], true);
    assert_eq!(
        reply["newCards"],
        json!([{"rank": "K", "suit": "Diamonds"}, {"rank": "K", "suit": "Clubs"}])
    );
    assert_eq!(reply["message"], "Player 1 got 2 cards of K from Player 2");

    assert_eq!(
        next_json(&mut p1).await,
        json!({"action": "wait", "player_turn": "Player 2"})
    );
    assert_eq!(next_json(&mut p2).await, json!({"action": "your_turn"}));

    let a = session.hand_of("Player 1").await.unwrap();
    assert_eq!(a.len(), 9);
    assert_eq!(a.iter().filter(|c| c.rank == Rank::King).count(), 3);
    let b = session.hand_of("Player 2").await.unwrap();
    assert!(b.iter().all(|c| c.rank != Rank::King));

    session.stop().await;
    join(t1).await;
    join(t2).await;
}

/// Scenario C over the wire, missed draw.
#[tokio::test]
async fn test_ask_go_fish_reports_drawn_card() {
    let drawn = c(Rank::Ace, Suit::Clubs);
    let (session, mut p1, mut p2, t1, t2) = started(two_kings_deck(&[drawn])).await;

    send(
        &p1,
        json!({"action": "ask_for_card", "targetPlayerName": "Player 2", "rank": "2"}),
    );

    let reply = next_json(&mut p1).await;
    assert_eq!(reply["result"], "go_fish");
    assert_eq!(reply["cardsReceived"], false);
    assert_eq!(reply["newCards"], json!([]));
    assert_eq!(reply["drawnCard"], json!({"rank": "A", "suit": "Clubs"}));
    assert_eq!(next_json(&mut p2).await, json!({"action": "your_turn"}));
    assert!(session.is_current_turn("Player 2").await);

    session.stop().await;
    join(t1).await;
    join(t2).await;
}

/// Scenario E over the wire.
#[tokio::test]
async fn test_ask_self_is_error_and_turn_stays() {
    let (session, mut p1, _p2, t1, t2) = started(two_kings_deck(&[])).await;
    let deck_before = session.snapshot().await.deck_len;

    send(
        &p1,
        json!({"action": "ask_for_card", "targetPlayerName": "Player 1", "rank": "K"}),
    );

    let reply = next_json(&mut p1).await;
    assert_eq!(reply["status"], "error");
    assert!(
        reply["error"]["message"]
            .as_str()
            .unwrap()
            .contains("invalid target")
    );
    assert!(session.is_current_turn("Player 1").await);
    assert_eq!(session.snapshot().await.deck_len, deck_before);

    session.stop().await;
    join(t1).await;
    join(t2).await;
}

#[tokio::test]
async fn test_ask_missing_rank_is_error() {
    let (session, mut p1, _p2, t1, t2) = started(two_kings_deck(&[])).await;

    send(
        &p1,
        json!({"action": "ask_for_card", "targetPlayerName": "Player 2"}),
    );

    let reply = next_json(&mut p1).await;
    assert_eq!(reply["status"], "error");
    assert_eq!(reply["error"]["message"], "missing field 'rank'");
    assert!(session.is_current_turn("Player 1").await);

    session.stop().await;
    join(t1).await;
    join(t2).await;
}

#[tokio::test]
async fn test_ask_that_completes_book_ends_game() {
    let [a2, a3, a4, a5, a6] = hearts([Rank::Two, Rank::Three, Rank::Four, Rank::Five, Rank::Six]);
    let [b8, b9, b10, bj, bq] =
        hearts([Rank::Eight, Rank::Nine, Rank::Ten, Rank::Jack, Rank::Queen]);
    let deck = deck_for(
        [c(Rank::King, Suit::Hearts), c(Rank::King, Suit::Spades), a2, a3, a4, a5, a6],
        [c(Rank::King, Suit::Diamonds), c(Rank::King, Suit::Clubs), b8, b9, b10, bj, bq],
        &[],
    );
    let (session, mut p1, mut p2, t1, t2) = started(deck).await;

    send(
        &p1,
        json!({"action": "ask_for_card", "targetPlayerName": "Player 2", "rank": "K"}),
    );

    assert_eq!(next_json(&mut p1).await["result"], "success");
    let over = next_json(&mut p1).await;
    assert_eq!(over["action"], "game_over");
    assert_eq!(over["winners"], json!(["Player 1"]));
    assert_eq!(next_json(&mut p2).await, over);

    assert_eq!(session.state().await, TableState::Finished);
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.winners, Some(vec!["Player 1".to_string()]));
    assert_eq!(snapshot.players[0].books, 1);
    assert_eq!(snapshot.current_player, None);
    assert!(!session.is_current_turn("Player 1").await);
    assert!(!session.is_current_turn("Player 2").await);

    send(&p2, json!({"action": "draw_card"}));
    assert_eq!(next_json(&mut p2).await, json!({"error": "the game is over"}));

    session.stop().await;
    join(t1).await;
    join(t2).await;
}

// =========================================================================
// Bad requests
// =========================================================================

#[tokio::test]
async fn test_unknown_action_gets_error_and_connection_stays_open() {
    let session = Table::new(gid("g"), config());
    let (h1, mut p1) = seat(&session).await;
    let t1 = spawn_run(h1);

    send(&p1, json!({"action": "dance"}));
    assert_eq!(
        next_json(&mut p1).await,
        json!({"status": "error", "error": {"message": "unknown action 'dance'"}})
    );

    p1.send(&b"not json"[..]).unwrap();
    assert_eq!(next_json(&mut p1).await["status"], "error");

    send(&p1, json!({}));
    assert_eq!(next_json(&mut p1).await["status"], "error");

    send(&p1, json!({"action": "player_ready"}));
    assert_eq!(next_json(&mut p1).await, json!({"status": "ok"}));

    session.stop().await;
    join(t1).await;
}

// =========================================================================
// Eviction
// =========================================================================

async fn assert_evicted(session: &Table) {
    assert_eq!(session.handler_count().await, 0);
    assert_eq!(session.broadcaster().subscriber_count().await, 0);
    assert!(session.broadcaster().handlers().await.is_empty());
}

#[tokio::test]
async fn test_clean_close_evicts_handler() {
    let session = Table::new(gid("g"), config());
    let (h1, mut p1) = seat(&session).await;
    let t1 = spawn_run(h1);

    p1.close();
    join(t1).await;

    assert_evicted(&session).await;
}

#[tokio::test]
async fn test_transport_error_evicts_handler() {
    let session = Table::new(gid("g"), config());
    let (h1, mut p1) = seat(&session).await;
    let t1 = spawn_run(h1);

    p1.reset();
    join(t1).await;

    assert_evicted(&session).await;
}

#[tokio::test]
async fn test_stop_evicts_every_handler() {
    let session = Table::new(gid("g"), config());
    let (h1, _p1) = seat(&session).await;
    let (h2, _p2) = seat(&session).await;
    let t1 = spawn_run(Arc::clone(&h1));
    let t2 = spawn_run(Arc::clone(&h2));

    session.stop().await;
    join(t1).await;
    join(t2).await;

    assert!(h1.is_stopped() && h2.is_stopped());
    assert_evicted(&session).await;
}

#[tokio::test]
async fn test_evict_is_idempotent() {
    let session = Table::new(gid("g"), config());
    let (h1, _p1) = seat(&session).await;
    let (_h2, _p2) = seat(&session).await;

    session.evict(h1.conn_id()).await;
    session.evict(h1.conn_id()).await;

    assert_eq!(session.handler_count().await, 1);
    assert_eq!(session.player_names().await, vec!["Player 2"]);
}

#[tokio::test]
async fn test_disconnected_player_keeps_seat_in_game() {
    let (session, mut p1, _p2, t1, t2) = started(two_kings_deck(&[])).await;

    p1.close();
    join(t1).await;

    assert_eq!(session.handler_count().await, 1);
    assert_eq!(session.player_names().await, vec!["Player 1", "Player 2"]);
    let snapshot = session.snapshot().await;
    assert!(!snapshot.players[0].connected);
    assert!(snapshot.players[1].connected);

    session.stop().await;
    join(t2).await;
}

// =========================================================================
// Registry
// =========================================================================

#[tokio::test]
async fn test_find_or_create_returns_one_instance_under_concurrency() {
    let registry = Arc::new(SessionRegistry::<MemoryConnection>::new(config()));

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.find_or_create(&gid("same")).await })
        })
        .collect();
    let mut sessions = Vec::new();
    for task in tasks {
        sessions.push(task.await.unwrap());
    }

    assert!(sessions.iter().all(|s| Arc::ptr_eq(s, &sessions[0])));
    assert_eq!(registry.len().await, 1);

    let other = registry.find_or_create(&gid("other")).await;
    assert!(!Arc::ptr_eq(&other, &sessions[0]));
    assert_eq!(registry.session_ids().await, vec![gid("other"), gid("same")]);
}

#[tokio::test]
async fn test_handle_connection_refusal_replies_and_closes() {
    let registry = SessionRegistry::<MemoryConnection>::new(config());
    let session = registry.find_or_create(&gid("g")).await;
    let (_h, _p) = seat(&session).await;
    assert!(session.start_game().await);

    let (conn, mut peer) = MemoryConnection::pair();
    let result = registry
        .handle_connection(&gid("g"), UserId::from("late"), conn)
        .await;

    assert!(matches!(result, Err(TableError::NotJoinable(_))));
    let reply = next_json(&mut peer).await;
    assert_eq!(reply["status"], "error");
    assert!(peer.recv().await.is_none(), "connection dropped after refusal");
}

#[tokio::test]
async fn test_handle_connection_prunes_dead_session() {
    let registry = Arc::new(SessionRegistry::<MemoryConnection>::new(config()));
    let (conn, mut peer) = MemoryConnection::pair();

    let task = {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move {
            registry
                .handle_connection(&gid("g"), UserId::from("solo"), conn)
                .await
                .unwrap();
        })
    };

    send(&peer, json!({"action": "player_ready"}));
    assert_eq!(next_json(&mut peer).await, json!({"status": "ok"}));
    // min_players is 1, so readying alone starts the game.
    take_start(&mut peer).await;
    let session = registry.get(&gid("g")).await.unwrap();
    assert_eq!(session.state().await, TableState::InProgress);

    peer.close();
    join(task).await;

    assert!(registry.is_empty().await);
}

#[tokio::test]
async fn test_lobby_session_survives_prune() {
    let registry = SessionRegistry::<MemoryConnection>::new(config());
    registry.find_or_create(&gid("g")).await;

    assert_eq!(registry.prune().await, 0);
    assert_eq!(registry.len().await, 1);
}

#[tokio::test]
async fn test_stop_all_ends_every_handler() {
    let registry = Arc::new(SessionRegistry::<MemoryConnection>::new(config()));
    let mut peers = Vec::new();
    let mut tasks = Vec::new();

    for id in ["a", "b"] {
        let (conn, peer) = MemoryConnection::pair();
        let registry = Arc::clone(&registry);
        peers.push(peer);
        tasks.push(tokio::spawn(async move {
            registry
                .handle_connection(&gid(id), UserId::from(id), conn)
                .await
                .unwrap();
        }));
    }
    // Wait until both handlers are seated.
    for id in ["a", "b"] {
        loop {
            if let Some(session) = registry.get(&gid(id)).await {
                if session.handler_count().await == 1 {
                    break;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    registry.stop_all().await;
    for task in tasks {
        join(task).await;
    }

    for id in ["a", "b"] {
        let session = registry.get(&gid(id)).await.unwrap();
        assert_eq!(session.handler_count().await, 0);
    }
}

#[tokio::test]
async fn test_connection_ids_are_distinct() {
    let (a, _pa) = MemoryConnection::pair();
    let (b, _pb) = MemoryConnection::pair();
    assert_ne!(a.id(), b.id());
}
