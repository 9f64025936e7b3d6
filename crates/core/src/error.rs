//! Error types for mediaup
//!
//! Every fallible operation in the upload engine returns [`Error`]. Variants
//! are grouped by when they can occur: before any network call (validation,
//! media inspection), during a resumable transfer (transmission), or when a
//! remote endpoint answers with something we cannot use (transport).

use thiserror::Error;

use crate::params::MediaKind;

/// Result type alias for mediaup operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for mediaup operations
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed caller input: wrong media kind, missing album fields,
    /// batch size out of range, invalid aspect ratio.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Video is longer than the accepted maximum
    #[error("Video is too long. Maximum: {max_ms} ms. Got: {duration_ms} ms")]
    MediaTooLong { duration_ms: f64, max_ms: u64 },

    /// Container inspection could not locate the required metadata
    #[error("Unsupported media format: {0}")]
    UnsupportedMediaFormat(String),

    /// Media kind or parameter combination not understood
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Probe or transmit failure on the resumable path
    #[error("Transmission error: {0}")]
    Transmission(String),

    /// Resumable upload gave up after its attempt budget
    #[error("All retries have failed for {kind} upload ({attempts} attempts): {last_error}")]
    RetriesExhausted {
        kind: MediaKind,
        attempts: u32,
        last_error: String,
    },

    /// Non-2xx or malformed response
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request could not be delivered
    #[error("Network error: {0}")]
    Network(String),

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Error {
    /// Whether the error was raised before any network interaction
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::MediaTooLong { .. }
                | Error::UnsupportedMediaFormat(_)
                | Error::InvalidConfiguration(_)
        )
    }

    /// Whether a resumable transfer should re-probe after this error
    pub fn is_retryable(&self) -> bool {
        crate::retry::is_retryable_error(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_too_long_message() {
        let err = Error::MediaTooLong {
            duration_ms: 64000.0,
            max_ms: 63000,
        };
        assert_eq!(
            err.to_string(),
            "Video is too long. Maximum: 63000 ms. Got: 64000 ms"
        );
    }

    #[test]
    fn test_retries_exhausted_names_kind() {
        let err = Error::RetriesExhausted {
            kind: MediaKind::Video,
            attempts: 5,
            last_error: "connection reset".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("video"));
        assert!(msg.contains("All retries have failed"));
    }

    #[test]
    fn test_is_local() {
        assert!(Error::Validation("x".into()).is_local());
        assert!(Error::UnsupportedMediaFormat("x".into()).is_local());
        assert!(!Error::Transport("x".into()).is_local());
        assert!(!Error::Transmission("x".into()).is_local());
    }
}
