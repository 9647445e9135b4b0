//! Error types for MeAd

use thiserror::Error;

/// Result type alias using MeAd's Error
pub type Result<T> = std::result::Result<T, Error>;

/// MeAd error types with helpful messages and suggestions
///
/// Only conditions that reach the caller live here. A failing external
/// source never produces an `Error`; it is logged and contributes nothing
/// (see [`TransportError`]).
#[derive(Error, Debug)]
pub enum Error {
    // Entity errors (E001-E099)
    #[error("Entity '{0}' not found. Run `mead list` to see all known entities.")]
    EntityNotFound(String),

    // Fact store errors (E100-E199)
    #[error("Fact store error: {0}")]
    FactStore(String),

    #[error("Invalid fact store data: {0}")]
    InvalidFactStore(#[from] serde_json::Error),

    // Network errors (E200-E299)
    #[error("Network error: {0}")]
    NetworkError(reqwest::Error),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Input errors (E800-E899)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Generic errors
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::EntityNotFound(_) => "E001",
            Self::FactStore(_) => "E100",
            Self::InvalidFactStore(_) => "E101",
            Self::NetworkError(_) => "E200",
            Self::ConfigError(_) => "E600",
            Self::InvalidInput(_) => "E800",
            Self::Other(_) | Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::EntityNotFound(_) => Some("mead list".to_string()),
            Self::InvalidFactStore(_) | Self::FactStore(_) => {
                Some("Check the file passed with `mead --store <path>`".to_string())
            }
            Self::NetworkError(_) => Some("Check network connectivity".to_string()),
            Self::ConfigError(_) => Some("mead config list".to_string()),
            _ => None,
        }
    }

    /// Whether this error means the requested entity does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::EntityNotFound(_))
    }
}

/// Failure of a single remote call.
///
/// Never propagated past a source client: the client logs it and returns an
/// empty contribution.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    #[error("remote returned HTTP {0}")]
    Status(u16),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Decode(String),
}

impl TransportError {
    /// Short label used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "timeout",
            Self::Status(_) => "status",
            Self::Request(_) => "request",
            Self::Decode(_) => "decode",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::EntityNotFound("asthma".into()).code(), "E001");
        assert_eq!(Error::ConfigError("bad".into()).code(), "E600");
        assert_eq!(Error::Other("x".into()).code(), "E9999");
    }

    #[test]
    fn test_not_found_message_and_suggestion() {
        let err = Error::EntityNotFound("nope".to_string());
        assert!(err.to_string().contains("'nope'"));
        assert!(err.is_not_found());
        assert_eq!(err.suggestion().as_deref(), Some("mead list"));
    }

    #[test]
    fn test_transport_error_kind() {
        assert_eq!(TransportError::Timeout(800).kind(), "timeout");
        assert_eq!(TransportError::Status(503).kind(), "status");
        assert_eq!(
            TransportError::Decode("missing results".into()).to_string(),
            "malformed response: missing results"
        );
    }
}
