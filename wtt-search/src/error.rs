//! Error types for the wtt-search crate.
//!
//! [`SearchError`] describes why a single provider call failed.
//! [`ErrorKind`] is the stable, pipeline-wide classification that ends up
//! recorded on results and artifacts. No API keys appear in messages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable error codes for programmatic handling.
///
/// These never change and form part of the public contract.
pub mod error_codes {
    /// Empty or malformed subject.
    pub const INVALID_INPUT: &str = "INVALID_INPUT";

    /// A query exhausted its retries (or was cancelled).
    pub const RETRIEVAL_FAILED: &str = "RETRIEVAL_FAILED";

    /// The language-model classification step failed.
    pub const CLASSIFICATION_UNAVAILABLE: &str = "CLASSIFICATION_UNAVAILABLE";

    /// The first sentence alone exceeded the token budget.
    pub const BUDGET_EXCEEDED_IRRECOVERABLE: &str = "BUDGET_EXCEEDED_IRRECOVERABLE";
}

/// Pipeline-wide failure classification.
///
/// Only [`ErrorKind::InvalidInput`] is fatal to a research run; the other
/// kinds are recorded and recovered from locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    RetrievalFailed,
    ClassificationUnavailable,
    BudgetExceededIrrecoverable,
}

impl ErrorKind {
    /// Returns the stable SCREAMING_SNAKE_CASE code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput => error_codes::INVALID_INPUT,
            Self::RetrievalFailed => error_codes::RETRIEVAL_FAILED,
            Self::ClassificationUnavailable => error_codes::CLASSIFICATION_UNAVAILABLE,
            Self::BudgetExceededIrrecoverable => error_codes::BUDGET_EXCEEDED_IRRECOVERABLE,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Errors that can occur while talking to a search provider.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Transport-level failure (connection refused, DNS, TLS, reset).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The provider answered with a non-success status.
    #[error("provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    /// A provider call did not complete within the configured timeout.
    #[error("search timed out: {0}")]
    Timeout(String),

    /// The provider response could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid search configuration.
    #[error("config error: {0}")]
    Config(String),

    /// The caller cancelled the query.
    #[error("cancelled: {0}")]
    Cancelled(String),
}

impl SearchError {
    /// Returns true for transient failures worth another attempt.
    ///
    /// Transport errors, timeouts, rate limits (429) and server errors (5xx)
    /// are transient. Client errors, parse failures, configuration errors
    /// and cancellation are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout(_) => true,
            Self::Provider { status, .. } => *status == 429 || (500..600).contains(status),
            Self::Parse(_) | Self::Config(_) | Self::Cancelled(_) => false,
        }
    }
}

/// Convenience type alias for wtt-search results.
pub type Result<T> = std::result::Result<T, SearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_http() {
        let err = SearchError::Http("connection refused".into());
        assert_eq!(err.to_string(), "HTTP error: connection refused");
    }

    #[test]
    fn display_provider() {
        let err = SearchError::Provider {
            status: 503,
            message: "unavailable".into(),
        };
        assert_eq!(err.to_string(), "provider returned 503: unavailable");
    }

    #[test]
    fn display_timeout() {
        let err = SearchError::Timeout("exceeded 10s limit".into());
        assert_eq!(err.to_string(), "search timed out: exceeded 10s limit");
    }

    #[test]
    fn server_errors_and_rate_limits_retryable() {
        for status in [429u16, 500, 502, 503, 504] {
            let err = SearchError::Provider {
                status,
                message: String::new(),
            };
            assert!(err.is_retryable(), "{status} should be retryable");
        }
        assert!(SearchError::Http("reset".into()).is_retryable());
        assert!(SearchError::Timeout("slow".into()).is_retryable());
    }

    #[test]
    fn client_errors_not_retryable() {
        for status in [400u16, 401, 403, 404, 422] {
            let err = SearchError::Provider {
                status,
                message: String::new(),
            };
            assert!(!err.is_retryable(), "{status} should not be retryable");
        }
        assert!(!SearchError::Parse("bad json".into()).is_retryable());
        assert!(!SearchError::Config("no key".into()).is_retryable());
        assert!(!SearchError::Cancelled("deadline".into()).is_retryable());
    }

    #[test]
    fn error_kind_codes_stable() {
        assert_eq!(ErrorKind::InvalidInput.code(), "INVALID_INPUT");
        assert_eq!(ErrorKind::RetrievalFailed.code(), "RETRIEVAL_FAILED");
        assert_eq!(
            ErrorKind::ClassificationUnavailable.code(),
            "CLASSIFICATION_UNAVAILABLE"
        );
        assert_eq!(
            ErrorKind::BudgetExceededIrrecoverable.to_string(),
            "BUDGET_EXCEEDED_IRRECOVERABLE"
        );
    }

    #[test]
    fn error_kind_serde_snake_case() {
        let json = serde_json::to_string(&ErrorKind::RetrievalFailed).expect("serialize");
        assert_eq!(json, "\"retrieval_failed\"");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SearchError>();
    }
}
