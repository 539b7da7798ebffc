//! LLM error types

use std::time::Duration;
use thiserror::Error;

/// LLM error with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct LlmError {
    pub kind: LlmErrorKind,
    pub message: String,
    pub retry_after: Option<Duration>,
}

impl LlmError {
    pub fn new(kind: LlmErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn with_retry_after(mut self, duration: Duration) -> Self {
        self.retry_after = Some(duration);
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Network, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::RateLimit, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::ServerError, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Auth, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::InvalidRequest, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Unknown, message)
    }

    /// Classify a non-2xx provider response
    pub fn from_status(status: u16, message: &str) -> Self {
        match status {
            401 | 403 => Self::auth(format!("Authentication failed: {message}")),
            429 => Self::rate_limit(format!("Rate limit exceeded: {message}")),
            400 => Self::invalid_request(format!("Invalid request: {message}")),
            500..=599 => Self::server_error(format!("Server error: {message}")),
            _ => Self::unknown(format!("HTTP {status}: {message}")),
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::network(format!("Request timeout: {e}"))
        } else if e.is_connect() {
            Self::network(format!("Connection failed: {e}"))
        } else {
            Self::unknown(format!("Request failed: {e}"))
        }
    }
}

/// Error classification for the host's retry decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// Network issues, timeouts - retryable
    Network,
    /// Rate limited (429) - retryable with backoff
    RateLimit,
    /// Server error (5xx) - retryable
    ServerError,
    /// Authentication failed (401, 403) - not retryable
    Auth,
    /// Bad request (400) or unrenderable prompt - not retryable
    InvalidRequest,
    /// Unknown error
    Unknown,
}

impl LlmErrorKind {
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::RateLimit | Self::ServerError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(LlmError::from_status(401, "x").kind, LlmErrorKind::Auth);
        assert_eq!(LlmError::from_status(403, "x").kind, LlmErrorKind::Auth);
        assert_eq!(LlmError::from_status(429, "x").kind, LlmErrorKind::RateLimit);
        assert_eq!(
            LlmError::from_status(400, "x").kind,
            LlmErrorKind::InvalidRequest
        );
        assert_eq!(
            LlmError::from_status(503, "x").kind,
            LlmErrorKind::ServerError
        );
        assert_eq!(LlmError::from_status(418, "x").kind, LlmErrorKind::Unknown);
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(LlmErrorKind::Network.is_retryable());
        assert!(LlmErrorKind::RateLimit.is_retryable());
        assert!(LlmErrorKind::ServerError.is_retryable());
        assert!(!LlmErrorKind::Auth.is_retryable());
        assert!(!LlmErrorKind::InvalidRequest.is_retryable());
        assert!(!LlmErrorKind::Unknown.is_retryable());
    }
}
