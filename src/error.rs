//! Error types for vectorsql.
//!
//! Every fallible operation in the crate returns [`VectorDbError`] through the
//! crate-wide [`Result`] alias. Errors are tagged values, not control-flow
//! escapes: bulk operations (DELETE, DROP, the snapshot loop feeding a vector
//! search) skip individual records that fail and continue with the rest, while
//! everything else surfaces the first failure to the caller.

use thiserror::Error;

/// Result type alias for vectorsql operations.
pub type Result<T> = std::result::Result<T, VectorDbError>;

/// Errors that can occur across the store, index, and query layers.
#[derive(Debug, Error)]
pub enum VectorDbError {
    /// Two vectors with different dimensions were handed to a distance metric.
    #[error("invalid vector dimension: expected {expected}, got {got}")]
    InvalidDimension { expected: usize, got: usize },

    /// Lookup, update, or delete for an id that is not present.
    #[error("vector not found: {0}")]
    VectorNotFound(String),

    /// Insert collided with an existing id.
    #[error("vector already exists: {0}")]
    VectorAlreadyExists(String),

    /// A k-nearest-neighbor search was asked for fewer than one result.
    #[error("k must be greater than 0, got {0}")]
    InvalidK(usize),

    /// Search on an index with zero live vectors.
    #[error("index contains no vectors")]
    EmptyIndex,

    /// Search or construction attempted with no distance metric installed.
    #[error("distance metric is required")]
    MetricRequired,

    /// Unrecognized distance metric tag.
    #[error("unknown distance metric: {0}")]
    UnknownMetric(String),

    /// Malformed token or ungrammatical input in the SQL surface.
    #[error("parse error: {0}")]
    Parse(String),

    /// Semantically invalid query (missing FROM, DELETE without WHERE, ...).
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Construct recognized by the parser but not executable yet.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// A persisted record or index blob failed to decode or checksum.
    #[error("corrupted data: {0}")]
    Corrupted(String),

    /// Underlying filesystem failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl VectorDbError {
    /// Creates a parse error with the given message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Creates an invalid-query error with the given message.
    pub fn invalid_query(msg: impl Into<String>) -> Self {
        Self::InvalidQuery(msg.into())
    }

    /// Creates a corrupted-data error with the given message.
    pub fn corrupted(msg: impl Into<String>) -> Self {
        Self::Corrupted(msg.into())
    }

    /// Returns true if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::VectorNotFound(_))
    }

    /// Returns true if this error came from the SQL front-end
    /// (tokenizer, parser, or semantic validation).
    pub fn is_query_error(&self) -> bool {
        matches!(self, Self::Parse(_) | Self::InvalidQuery(_))
    }
}
