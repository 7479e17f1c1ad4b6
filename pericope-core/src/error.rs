//! Error types for pericope-core.

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for byte-level primitives.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Read past the logical length of a byte array.
    #[error("byte array read out of range: offset {offset} (length {length})")]
    OutOfRange { offset: usize, length: usize },

    /// Varint decoding failed (truncated or overflowing u32).
    #[error("varint error at offset {0}: {1}")]
    Varint(usize, String),

    /// Base64 payload failed to decode.
    #[error("base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Hex payload failed to decode.
    #[error("hex error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Tag does not match the required shape.
    #[error("invalid tag: '{0}'")]
    InvalidTag(String),
}
