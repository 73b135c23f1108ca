//! Error types for paperdex.

use thiserror::Error;

/// Top-level result type for paperdex operations.
pub type Result<T> = std::result::Result<T, PdxError>;

/// Top-level error type for paperdex.
#[derive(Debug, Error)]
pub enum PdxError {
    #[error("query error: {0}")]
    Query(#[from] QueryError),

    #[error("extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("store error: {0}")]
    Store(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Errors raised while turning a query sentence into SQL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The sentence does not match the query grammar. Nothing is executed.
    #[error("invalid query syntax in '{input}': {message}")]
    InvalidQuerySyntax { input: String, message: String },
}

/// Errors raised by the entity extraction layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// The recognizer could not be loaded or is no longer usable.
    #[error("entity recognizer unavailable: {0}")]
    ModelUnavailable(String),

    #[error("entity recognition failed: {0}")]
    Recognition(String),

    #[error("extraction window must hold at least one token")]
    InvalidWindow,
}

impl PdxError {
    /// True when the error should be shown to an interactive user as a
    /// bad query rather than as a failure.
    #[must_use]
    pub fn is_invalid_query(&self) -> bool {
        matches!(self, Self::Query(QueryError::InvalidQuerySyntax { .. }))
    }
}
