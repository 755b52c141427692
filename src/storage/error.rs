//! Storage error types
//!
//! Defines all errors that can occur in the record store.

use thiserror::Error;

/// Errors that can occur in the record store
#[derive(Error, Debug)]
pub enum StorageError {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// SQLite rejected a statement or the connection failed
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Caller supplied a zero id, an unknown field, or a value the schema rejects
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Column is not part of the table schema
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// Column may only be written at insert time
    #[error("Column is immutable: {0}")]
    ImmutableColumn(String),

    /// Text value exceeds the column width
    #[error("Value too long for column {column}: {len} > {max}")]
    ValueTooLong {
        column: String,
        len: usize,
        max: usize,
    },

    /// Table is missing and could not be created
    #[error("Table error: {0}")]
    Table(String),

    /// Lock acquisition failed
    #[error("Lock error: {0}")]
    Lock(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::UnknownColumn("referrer".to_string());
        assert_eq!(err.to_string(), "Unknown column: referrer");

        let err = StorageError::ValueTooLong {
            column: "ip".to_string(),
            len: 120,
            max: 100,
        };
        assert_eq!(err.to_string(), "Value too long for column ip: 120 > 100");
    }

    #[test]
    fn test_sqlite_error_conversion() {
        let sqlite_err = rusqlite::Error::QueryReturnedNoRows;
        let storage_err: StorageError = sqlite_err.into();
        assert!(matches!(storage_err, StorageError::Sqlite(_)));
    }
}
