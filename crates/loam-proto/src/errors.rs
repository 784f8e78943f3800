//! Error types for the Loam wire protocol.
//!
//! All errors are structured, testable, and provide actionable information.

use thiserror::Error;

/// Protocol-level errors that can occur while decoding or encoding messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Text frame is not valid JSON
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    /// Text frame is valid JSON but not an object
    #[error("message is not a JSON object")]
    NotAnObject,

    /// Known message type whose fields have the wrong shape
    #[error("invalid {kind} payload: {reason}")]
    InvalidPayload {
        /// Message type being decoded
        kind: &'static str,
        /// Decoder error
        reason: String,
    },

    /// Failed to encode an outbound message
    #[error("failed to encode message: {0}")]
    Encode(String),
}

/// Convenient Result type alias for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
