//! Codec trait and the JSON implementation.
//!
//! Both the match store and the outbound channels need to turn
//! [`SessionState`](crate::SessionState) and
//! [`OutboundEvent`](crate::OutboundEvent) into bytes. They do it through
//! [`Codec`] so the format can be swapped without touching either side.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes values to bytes and decodes them back.
///
/// `Send + Sync + 'static` because a codec lives inside long-running
/// match tasks and shared stores.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if the value cannot be
    /// represented in this format.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// JSON is what browser clients consume and what the match table stores,
/// so this is the default everywhere.
///
/// ```rust
/// use matchforge_protocol::{Codec, JsonCodec, MatchId, OutboundEvent};
///
/// let codec = JsonCodec;
/// let event = OutboundEvent::MatchBegin(MatchId::new("m-1"));
///
/// let bytes = codec.encode(&event).unwrap();
/// let decoded: OutboundEvent = codec.decode(&bytes).unwrap();
/// assert_eq!(event, decoded);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
