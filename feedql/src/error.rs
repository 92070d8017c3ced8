//! Error types for FeedQL validation and compilation

use thiserror::Error;

/// FeedQL query error type
///
/// Validation is fail-fast: the first violated rule is reported and nothing
/// after it is checked.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Input was absent or falsy (`null`, `false`, `0`, `""`)
    #[error("query should be truthy: {value}")]
    NotTruthy { value: String },

    /// Input was neither a JSON string nor an object
    #[error("query should be a string or an object, found {found}")]
    InvalidShapeKind { found: String },

    /// String input failed to decode as JSON
    #[error("query is not valid JSON: {message}")]
    MalformedJson { message: String },

    /// Record carries more fields than the tier allows
    #[error("query has too many fields: expected {expected}, found {found}")]
    TooManyFields { expected: usize, found: usize },

    /// Required field is absent
    #[error("query is missing the \"{field}\" field")]
    MissingField { field: &'static str },

    /// Field is present with the wrong JSON type
    #[error("query \"{field}\" should be {expected}")]
    WrongFieldType {
        field: &'static str,
        expected: &'static str,
    },

    /// Fields are individually valid but contradict each other
    #[error("invariant violated: {message}")]
    InvariantViolation { message: String },

    /// Author failed the feed-id format check
    #[error("query author should be a valid feed ID: {feed_id}")]
    InvalidFeedId { feed_id: String },

    /// `op` names no known operator
    #[error("unknown \"op\" field: {op}")]
    UnknownOperator { op: String },

    /// Combinator `args` is not an array
    #[error("\"args\" field must be an array")]
    ArgsNotSequence,

    /// Operation deliberately not provided
    #[error("{operation} is not supported: {reason}")]
    NotSupported {
        operation: &'static str,
        reason: &'static str,
    },
}

/// Result type for FeedQL operations
pub type Result<T> = std::result::Result<T, QueryError>;

impl QueryError {
    pub fn missing(field: &'static str) -> Self {
        QueryError::MissingField { field }
    }

    pub fn wrong_type(field: &'static str, expected: &'static str) -> Self {
        QueryError::WrongFieldType { field, expected }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        QueryError::InvariantViolation {
            message: message.into(),
        }
    }
}
