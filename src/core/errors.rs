//! Custom error types for translation operations

use thiserror::Error;

/// Translation-related errors
#[derive(Error, Debug)]
pub enum TranslationError {
    /// A required field is missing or empty; raised before any generator call
    #[error("Validation error: {message}")]
    ValidationError {
        /// What was wrong with the input
        message: String,
    },

    /// One attempt exceeded its time budget
    #[error("Generation attempt timeout after {timeout_ms}ms")]
    AttemptTimeout {
        /// Budget that was exceeded
        timeout_ms: u64,
    },

    /// The generator finished without producing any text
    #[error("No translation result received from generator")]
    EmptyResult,

    /// Every attempt failed; carries the last observed cause
    #[error("Generation failed after {attempts} attempts: {source}")]
    GenerationFailure {
        /// Attempts made
        attempts: u32,
        /// Cause of the final attempt's failure
        #[source]
        source: Box<TranslationError>,
    },

    /// API request failed
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// Rate limit exceeded
    #[error("Rate limit exceeded. Retry after {retry_after:?} seconds")]
    RateLimitError {
        /// Seconds suggested by the `retry-after` header
        retry_after: Option<u64>,
    },

    /// Network error
    #[error("Network error: {message}")]
    NetworkError {
        /// Transport error text
        message: String,
    },

    /// Invalid response from API
    #[error("Invalid response: {message}")]
    InvalidResponseError {
        /// What could not be understood
        message: String,
    },

    /// Configuration rejected while building a client
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Rejected setting
        message: String,
    },

    /// Reqwest error
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),
}

/// Stable, machine-checkable error categories exposed to API callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad or missing input
    Validation,
    /// The last generation attempt timed out
    Timeout,
    /// The upstream generator is rate limiting us
    RateLimited,
    /// Generation failed for any other reason
    GenerationFailed,
    /// Anything else
    Internal,
}

impl ErrorCategory {
    /// Wire code used in the `error` field of API error bodies
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "validation_error",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::RateLimited => "rate_limited",
            ErrorCategory::GenerationFailed => "generation_failed",
            ErrorCategory::Internal => "internal_error",
        }
    }
}

impl TranslationError {
    /// Shorthand for a configuration failure
    pub fn config(err: impl std::fmt::Display) -> Self {
        TranslationError::ConfigError {
            message: err.to_string(),
        }
    }

    /// Shorthand for a validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        TranslationError::ValidationError {
            message: message.into(),
        }
    }

    /// Innermost cause, looking through `GenerationFailure`
    pub fn root_cause(&self) -> &TranslationError {
        match self {
            TranslationError::GenerationFailure { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Whether the (last) cause was a timeout
    pub fn is_timeout(&self) -> bool {
        match self.root_cause() {
            TranslationError::AttemptTimeout { .. } => true,
            TranslationError::HttpError(e) => e.is_timeout(),
            other => {
                let message = other.to_string().to_lowercase();
                message.contains("timeout") || message.contains("timed out")
            }
        }
    }

    /// Whether the (last) cause indicates upstream rate limiting
    pub fn is_rate_limited(&self) -> bool {
        match self.root_cause() {
            TranslationError::RateLimitError { .. } => true,
            TranslationError::ApiError { status: 429, .. } => true,
            other => {
                let message = other.to_string().to_lowercase();
                message.contains("rate limit") || message.contains("too many requests")
            }
        }
    }

    /// Category used for HTTP status mapping and the `error` field
    pub fn category(&self) -> ErrorCategory {
        match self {
            TranslationError::ValidationError { .. } => ErrorCategory::Validation,
            _ if self.is_timeout() => ErrorCategory::Timeout,
            _ if self.is_rate_limited() => ErrorCategory::RateLimited,
            TranslationError::GenerationFailure { .. }
            | TranslationError::AttemptTimeout { .. }
            | TranslationError::EmptyResult
            | TranslationError::ApiError { .. }
            | TranslationError::NetworkError { .. }
            | TranslationError::InvalidResponseError { .. }
            | TranslationError::HttpError(_) => ErrorCategory::GenerationFailed,
            _ => ErrorCategory::Internal,
        }
    }
}

/// Result type for translation operations
pub type Result<T> = std::result::Result<T, TranslationError>;
