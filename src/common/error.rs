//! Error types for the application.

use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

/// Completion-backend errors.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Completion API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Completion API returned no choices")]
    EmptyResponse,
}

impl CompletionError {
    /// Whether a retry has a chance of succeeding.
    ///
    /// Transport failures and 429/5xx responses are transient; everything
    /// else (bad request, bad key, empty body) is not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::EmptyResponse => false,
        }
    }
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for completion operations.
pub type CompletionResult<T> = std::result::Result<T, CompletionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_transience() {
        let rate_limited = CompletionError::Api {
            status: 429,
            message: "slow down".to_string(),
        };
        assert!(rate_limited.is_transient());

        let server_error = CompletionError::Api {
            status: 503,
            message: "overloaded".to_string(),
        };
        assert!(server_error.is_transient());

        let bad_key = CompletionError::Api {
            status: 401,
            message: "invalid api key".to_string(),
        };
        assert!(!bad_key.is_transient());

        assert!(!CompletionError::EmptyResponse.is_transient());
    }
}
