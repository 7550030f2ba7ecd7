//! Message types for Fishbowl's wire format.
//!
//! Everything a server writes to a client is a [`ServerMessage`]. Most of
//! those are [`ServerEvent`]s, which carry an `"action"` tag the same way
//! client requests do; the rest are bare replies (a drawn card, an ack, an
//! error) that clients match by shape.

use std::fmt;

use fishbowl_engine::{AskOutcome, Card};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifies one game session. Clients send it as `gid` in the handshake.
///
/// `#[serde(transparent)]` keeps it a plain JSON string on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The identity an authenticator vouched for.
///
/// Distinct from the in-game player name, which the session assigns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ---------------------------------------------------------------------------
// Handshake
// ---------------------------------------------------------------------------

/// First frame on a new connection: which session to join, and the
/// credential to present for it.
///
/// ```json
/// {"gid": "table-1", "token": "abc"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handshake {
    pub gid: SessionId,
    #[serde(default)]
    pub token: Option<String>,
}

// ---------------------------------------------------------------------------
// ServerEvent: tagged by "action"
// ---------------------------------------------------------------------------

/// Whether an ask got cards from the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AskStatus {
    Success,
    GoFish,
}

/// Server-initiated messages, internally tagged by `"action"`.
///
/// `YourTurn` serializes as `{"action":"your_turn"}`; struct variants add
/// their fields next to the tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ServerEvent {
    /// The player's dealt cards. Sent once per player per game.
    InitialHand { cards: Vec<Card> },

    StartGame { message: String },

    YourTurn,

    /// Someone else is up.
    Wait { player_turn: String },

    UpdatePlayerList {
        #[serde(rename = "playerNames")]
        player_names: Vec<String>,
    },

    /// Reply to the asker of `ask_for_card`.
    AskResponse {
        result: AskStatus,
        #[serde(rename = "cardsReceived")]
        cards_received: bool,
        message: String,
        #[serde(rename = "newCards")]
        new_cards: Vec<Card>,
        /// The card drawn on a missed go-fish, so the client can add it
        /// to the hand it displays.
        #[serde(
            rename = "drawnCard",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        drawn_card: Option<Card>,
    },

    /// The game ended; everyone gets the same winners list.
    GameOver {
        winners: Vec<String>,
        message: String,
    },
}

impl ServerEvent {
    /// The `ask_response` for an engine outcome.
    ///
    /// A lucky draw reports as `go_fish` with the drawn card in `newCards`,
    /// so `cardsReceived` is true for it.
    pub fn ask_response(outcome: &AskOutcome) -> Self {
        let new_cards = outcome.new_cards();
        // A lucky draw already shows up in `newCards`.
        let drawn_card = outcome.drawn().filter(|_| new_cards.is_empty());
        Self::AskResponse {
            result: if outcome.is_success() {
                AskStatus::Success
            } else {
                AskStatus::GoFish
            },
            cards_received: !new_cards.is_empty(),
            message: outcome.summary.clone(),
            new_cards,
            drawn_card,
        }
    }

    pub fn game_over(winners: Vec<String>) -> Self {
        let message = match winners.as_slice() {
            [] => "Game over!".to_string(),
            [one] => format!("Game over! {one} wins!"),
            many => format!("Game over! It's a tie between {}.", many.join(", ")),
        };
        Self::GameOver { winners, message }
    }
}

// ---------------------------------------------------------------------------
// Untagged replies
// ---------------------------------------------------------------------------

/// Reply to `draw_card`: `{"card": …}` or `{"error": "…"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DrawReply {
    Card { card: Card },
    Error { error: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
}

/// `{"status":"error","error":{"message":"…"}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReply {
    pub status: Status,
    pub error: ErrorDetail,
}

impl ErrorReply {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            error: ErrorDetail {
                message: message.into(),
            },
        }
    }
}

/// `{"status":"ok"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub status: Status,
}

// ---------------------------------------------------------------------------
// ServerMessage
// ---------------------------------------------------------------------------

/// Anything the server writes to a client.
///
/// Untagged: each variant serializes as its inner shape. Deserialization
/// (used by clients and tests) tries the variants in order, so `Error`
/// sits before `Ack`, whose shape is a subset of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerMessage {
    Event(ServerEvent),
    Draw(DrawReply),
    Error(ErrorReply),
    Ack(Ack),
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorReply::new(message))
    }

    pub fn ack() -> Self {
        Self::Ack(Ack { status: Status::Ok })
    }

    pub fn drawn(card: Card) -> Self {
        Self::Draw(DrawReply::Card { card })
    }

    pub fn draw_error(message: impl Into<String>) -> Self {
        Self::Draw(DrawReply::Error {
            error: message.into(),
        })
    }
}

impl From<ServerEvent> for ServerMessage {
    fn from(event: ServerEvent) -> Self {
        Self::Event(event)
    }
}

impl From<DrawReply> for ServerMessage {
    fn from(reply: DrawReply) -> Self {
        Self::Draw(reply)
    }
}

impl From<ErrorReply> for ServerMessage {
    fn from(reply: ErrorReply) -> Self {
        Self::Error(reply)
    }
}

// =========================================================================
// Tests
// =========================================================================
