//! Typed errors for the aggregation library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling. Only [`AggregationError`]
//! ever aborts a run; adapter and backend errors are contained where they
//! happen and end up in the run report.

use thiserror::Error;

use crate::types::query::QueryField;

/// Errors that abort an aggregation operation.
#[derive(Debug, Error)]
pub enum AggregationError {
    /// The query carried no usable field
    #[error("invalid query: {reason}")]
    InvalidQuery { reason: String },

    /// Two adapters registered under the same id
    #[error("duplicate source: {id}")]
    DuplicateSource { id: String },

    /// No adapter registered under this id
    #[error("unknown source: {id}")]
    UnknownSource { id: String },

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),
}

/// Errors a source adapter reports for one invocation.
///
/// None of these are fatal to a run.
#[derive(Debug, Clone, Error)]
pub enum AdapterError {
    /// Network failure or timeout
    #[error("source unreachable: {message}")]
    Unreachable { message: String, timeout: bool },

    /// Source refused the request or rate-limited us
    #[error("source blocked the request: {0}")]
    Blocked(String),

    /// Source was reached and found nothing
    #[error("no match")]
    NoMatch,

    /// Source answered with something we could not parse
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Adapter was invoked without any of the query fields it needs
    #[error("missing input: needs one of {required:?}")]
    MissingInput { required: Vec<QueryField> },
}

impl AdapterError {
    /// Network-level failure.
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::Unreachable {
            message: message.into(),
            timeout: false,
        }
    }

    /// Deadline or self-timeout elapsed before the adapter answered.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Unreachable {
            message: message.into(),
            timeout: true,
        }
    }
}

impl From<reqwest::Error> for AdapterError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::timeout(e.to_string())
        } else if e.is_decode() {
            Self::Malformed(e.to_string())
        } else {
            Self::unreachable(e.to_string())
        }
    }
}

/// Errors from the external language-understanding backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Backend could not be reached
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// Backend answered with a non-success status
    #[error("backend API error: {0}")]
    Api(String),

    /// Backend answer did not match the expected shape
    #[error("malformed backend response: {0}")]
    Malformed(String),

    /// Backend is not configured (missing key, bad URL)
    #[error("backend config error: {0}")]
    Config(String),
}

/// Result type alias for aggregation operations.
pub type Result<T> = std::result::Result<T, AggregationError>;

/// Result type alias for adapter invocations.
pub type AdapterResult<T> = std::result::Result<T, AdapterError>;

/// Result type alias for backend calls.
pub type BackendResult<T> = std::result::Result<T, BackendError>;
