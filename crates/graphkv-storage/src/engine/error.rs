//! Storage error types.

use thiserror::Error;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The database could not be opened.
    #[error("failed to open database: {0}")]
    Open(String),

    /// A transaction could not be started, committed or aborted.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// A keyspace exists with a different key ordering than the one requested.
    ///
    /// This is a configuration error: the comparator installed into the engine
    /// is part of the on-disk format and cannot change.
    #[error("keyspace ordering mismatch: {0}")]
    KeyspaceMismatch(String),

    /// A write was attempted on a read-only transaction.
    #[error("cannot write in a read-only transaction")]
    ReadOnly,

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The engine reported a failure while reading or writing.
    #[error("internal storage error: {0}")]
    Internal(String),
}

impl StorageError {
    /// Whether this error was caused by configuration rather than by the data.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::KeyspaceMismatch(_) | Self::Open(_))
    }
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
