//! Crate error types
//!
//! Construction errors surface immediately to the caller and are never retried.

use thiserror::Error;

/// Errors raised while building responses, registering routes or loading configuration
#[derive(Debug, Error)]
pub enum Error {
    /// Status code outside the valid range of the response kind
    #[error("status {status} is outside the valid range {min}-{max}")]
    InvalidStatus { status: u16, min: u16, max: u16 },

    /// Payload could not be serialized to XML
    #[error("XML serialization failed: {0}")]
    Xml(String),

    /// Payload could not be serialized to JSON
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Route pattern uses an unknown placeholder type such as `<uuid:id>`
    #[error("invalid placeholder type: {0}")]
    InvalidPlaceholderType(String),

    /// Route pattern is syntactically broken
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("invalid HTTP method: {0}")]
    InvalidMethod(String),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_status_message() {
        let err = Error::InvalidStatus {
            status: 302,
            min: 200,
            max: 299,
        };
        assert_eq!(err.to_string(), "status 302 is outside the valid range 200-299");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
