//! Wire protocol for Dicehall.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Entities** ([`Identity`], [`RollMessage`], [`RoomSummary`], …) —
//!   the records that travel on the wire and live in the directories.
//! - **Events** ([`ClientEvent`], [`ServerEvent`]) — the tagged inbound
//!   and outbound protocol messages.
//! - **Normalization** ([`clamp`]) — the length bounds applied to every
//!   untrusted string field at construction time.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how events are converted
//!   to and from text frames.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while encoding
//!   or decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (text frames) and the
//! directories (identity and room state). It doesn't know about
//! connections or rooms — it only knows shapes and bounds.
//!
//! ```text
//! Transport (frames) → Protocol (events) → Directories (state)
//! ```

mod codec;
mod error;
mod normalize;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use normalize::clamp;
pub use types::{
    Avatar, ClientEvent, Color, DieRoll, FieldDefect, Identity,
    Registration, RollAuthor, RollMessage, RoomSnapshot, RoomSummary,
    ServerEvent, MAX_AVATAR_NAME_LEN, MAX_AVATAR_URL_LEN,
    MAX_COLOR_HEX_LEN, MAX_COLOR_NAME_LEN, MAX_CONNECTION_LEN, MAX_ID_LEN,
    MAX_NAME_LEN, MAX_ROOM_NAME_LEN,
};
