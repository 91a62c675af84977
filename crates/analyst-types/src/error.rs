//! Error types for wire decoding.

use thiserror::Error;

/// Errors that can occur while decoding or validating wire payloads.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WireError {
    /// A frame could not be parsed as JSON or did not match its schema.
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// A frame was valid JSON but not an object with a `type` field.
    #[error("Malformed frame: {message}")]
    MalformedFrame { message: String },

    /// A layer number outside 1..=5 was supplied.
    #[error("Invalid layer number: {layer}")]
    InvalidLayer { layer: i64 },
}

impl WireError {
    /// Create a new serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a new malformed frame error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedFrame {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for WireError {
    fn from(err: serde_json::Error) -> Self {
        WireError::serialization(err.to_string())
    }
}

/// Result type for wire operations.
pub type WireResult<T> = Result<T, WireError>;
