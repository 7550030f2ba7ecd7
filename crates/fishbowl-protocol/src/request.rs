//! Inbound requests.
//!
//! Clients send one flat JSON object per frame, selected by `action`
//! (older clients say `command`). Decoding happens in two steps: serde
//! reads the loose [`RawRequest`] shape, then [`Request::try_from`] checks
//! the action and its required fields. That split lets the handler tell a
//! client *which* field was wrong instead of echoing a serde error.

use std::str::FromStr;

use fishbowl_engine::Rank;
use serde::{Deserialize, Serialize};

use crate::{Codec, ProtocolError};

/// The wire shape of a request, with every field optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRequest {
    #[serde(default, alias = "command", skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_player_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<String>,
}

/// A validated client request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    PlayerReady,
    DrawCard,
    AskForCard { target_player_name: String, rank: Rank },
}

impl Request {
    /// Decodes and validates one frame.
    ///
    /// # Errors
    /// `Decode` for bytes that aren't a JSON object, otherwise whatever
    /// [`Request::try_from`] reports.
    pub fn decode<C: Codec>(codec: &C, data: &[u8]) -> Result<Self, ProtocolError> {
        let raw: RawRequest = codec.decode(data)?;
        Self::try_from(raw)
    }

    /// The wire name of this request's action.
    pub fn action(&self) -> &'static str {
        match self {
            Self::PlayerReady => "player_ready",
            Self::DrawCard => "draw_card",
            Self::AskForCard { .. } => "ask_for_card",
        }
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ProtocolError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(ProtocolError::MissingField(field))
}

impl TryFrom<RawRequest> for Request {
    type Error = ProtocolError;

    fn try_from(raw: RawRequest) -> Result<Self, Self::Error> {
        let action = raw.action.ok_or(ProtocolError::MissingAction)?;
        match action.as_str() {
            "player_ready" => Ok(Self::PlayerReady),
            "draw_card" => Ok(Self::DrawCard),
            "ask_for_card" => {
                let target_player_name = required(raw.target_player_name, "targetPlayerName")?;
                let rank = required(raw.rank, "rank")?;
                let rank =
                    Rank::from_str(&rank).map_err(|_| ProtocolError::InvalidRank(rank))?;
                Ok(Self::AskForCard {
                    target_player_name,
                    rank,
                })
            }
            _ => Err(ProtocolError::UnknownAction(action)),
        }
    }
}

impl From<&Request> for RawRequest {
    fn from(request: &Request) -> Self {
        let mut raw = RawRequest {
            action: Some(request.action().to_string()),
            ..Default::default()
        };
        if let Request::AskForCard {
            target_player_name,
            rank,
        } = request
        {
            raw.target_player_name = Some(target_player_name.clone());
            raw.rank = Some(rank.symbol().to_string());
        }
        raw
    }
}
