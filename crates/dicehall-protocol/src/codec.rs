//! Codec trait and implementations for turning events into text frames.
//!
//! The protocol layer doesn't care how events are serialized — it just
//! needs something that implements the [`Codec`] trait. Dicehall frames
//! are text (one JSON document per WebSocket frame), so a codec produces
//! and consumes `String`s rather than byte buffers.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode protocol values to text and decode text back.
///
/// `encode` and `decode` are generic so the same codec handles both event
/// enums (and anything else serde-shaped the server wants to frame).
/// `DeserializeOwned` means decoded values own their data — the inbound
/// frame buffer can be dropped immediately after decoding.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into one text frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T)
        -> Result<String, ProtocolError>;

    /// Deserializes one text frame back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the text is malformed or does
    /// not match the expected shape.
    fn decode<T: DeserializeOwned>(
        &self,
        text: &str,
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use dicehall_protocol::{ClientEvent, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let text = codec.encode(&ClientEvent::RoomJoin("den".into())).unwrap();
/// let decoded: ClientEvent = codec.decode(&text).unwrap();
/// assert_eq!(decoded, ClientEvent::RoomJoin("den".into()));
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        text: &str,
    ) -> Result<T, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }
}
