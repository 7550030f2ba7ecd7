//! Wire protocol for Fishbowl.
//!
//! This crate defines what clients and the server say to each other:
//!
//! - **Requests** ([`Request`], [`RawRequest`]): `player_ready`,
//!   `draw_card`, `ask_for_card`, validated before they reach a session.
//! - **Server messages** ([`ServerMessage`], [`ServerEvent`]): events
//!   tagged by `action`, plus the untagged draw, ack, and error replies.
//! - **Identity** ([`SessionId`], [`UserId`], [`Handshake`]).
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how messages become
//!   bytes.
//!
//! # Architecture
//!
//! ```text
//! Transport (bytes) → Protocol (Request / ServerMessage) → Session (turns)
//! ```
//!
//! The protocol layer knows card values (it embeds them in messages) but
//! nothing about connections or turn order.

mod codec;
mod error;
mod request;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use request::{RawRequest, Request};
pub use types::{
    Ack, AskStatus, DrawReply, ErrorDetail, ErrorReply, Handshake, ServerEvent, ServerMessage,
    SessionId, Status, UserId,
};
