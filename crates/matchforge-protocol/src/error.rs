//! Error types for the protocol layer.

/// Errors that can occur while encoding, decoding, or validating
/// protocol values.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into bytes).
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Deserialization failed: malformed bytes, missing required fields,
    /// or values of the wrong type.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// The value decoded fine but breaks a state invariant, e.g. a
    /// stored match whose sides do not belong to its roster.
    #[error("invalid state: {0}")]
    InvalidState(String),
}
