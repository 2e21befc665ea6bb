//! Failure taxonomy for a single rate acquisition.

use thiserror::Error;

/// Errors a [`RateSource`](crate::core::source::RateSource) can report for one pair.
///
/// Each variant maps to a [`RetryClass`] through [`AcquireError::retry_class`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AcquireError {
    /// The source explicitly throttled the request (HTTP 429).
    #[error("Rate limited: {source_name}")]
    RateLimited { source_name: String },

    /// Network failure, timeout, unpopulated page or malformed response.
    #[error("Transient error: {source_name} - {message}")]
    Transient {
        source_name: String,
        message: String,
    },

    /// The source has no data for this pair.
    #[error("No data found: {source_name} has no rate for {pair}")]
    NotFound { source_name: String, pair: String },

    /// The session could not be opened or was torn down underneath a request.
    #[error("Session failure: {source_name} - {message}")]
    Session {
        source_name: String,
        message: String,
    },
}

/// How the backoff controller may treat an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    /// Retry on the backoff ladder.
    WithBackoff,
    /// Retry only when the policy opts into retrying transient failures.
    Transient,
    /// Terminal for this pair.
    Never,
}

impl AcquireError {
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::RateLimited { .. } => RetryClass::WithBackoff,
            Self::Transient { .. } => RetryClass::Transient,
            Self::NotFound { .. } | Self::Session { .. } => RetryClass::Never,
        }
    }

    pub(crate) fn transient(source_name: &str, message: impl Into<String>) -> Self {
        Self::Transient {
            source_name: source_name.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn rate_limited(source_name: &str) -> Self {
        Self::RateLimited {
            source_name: source_name.to_string(),
        }
    }

    pub(crate) fn not_found(source_name: &str, pair: impl Into<String>) -> Self {
        Self::NotFound {
            source_name: source_name.to_string(),
            pair: pair.into(),
        }
    }

    pub(crate) fn session(source_name: &str, message: impl Into<String>) -> Self {
        Self::Session {
            source_name: source_name.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_classes() {
        assert_eq!(
            AcquireError::rate_limited("api").retry_class(),
            RetryClass::WithBackoff
        );
        assert_eq!(
            AcquireError::transient("api", "timed out").retry_class(),
            RetryClass::Transient
        );
        assert_eq!(
            AcquireError::not_found("api", "EUR / XXX").retry_class(),
            RetryClass::Never
        );
        assert_eq!(
            AcquireError::session("page", "client build failed").retry_class(),
            RetryClass::Never
        );
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AcquireError::rate_limited("api").to_string(),
            "Rate limited: api"
        );
        assert_eq!(
            AcquireError::not_found("page", "EUR / USD").to_string(),
            "No data found: page has no rate for EUR / USD"
        );
        assert_eq!(
            AcquireError::transient("api", "HTTP 503").to_string(),
            "Transient error: api - HTTP 503"
        );
    }
}
