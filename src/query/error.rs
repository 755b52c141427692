//! Query error types
//!
//! Defines all error conditions that can occur while building and executing
//! log queries.

use thiserror::Error;

/// Errors that can occur during query operations
#[derive(Error, Debug)]
pub enum QueryError {
    /// Unknown filter field, unknown order column, or an impossible range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The read failed in the storage layer
    #[error("Query execution failed: {0}")]
    Execution(#[from] crate::storage::StorageError),
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;
