//! Error types for `graphkv`.
//!
//! Errors from the storage and logical layers never cross this crate's
//! boundary raw: they are classified into [`GraphError`].

use graphkv_core::LogicalError;
use graphkv_storage::StorageError;
use thiserror::Error;

/// Errors that can occur when using a graph store.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The store configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The store could not be opened.
    #[error("failed to open store: {0}")]
    Open(String),

    /// The engine failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A key or value could not be encoded or decoded.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// An operation does not match the kind of its database.
    #[error("scope error: {0}")]
    Scope(String),

    /// A cursor was used incorrectly.
    #[error("cursor error: {0}")]
    Cursor(String),

    /// A database or index could not be registered.
    #[error("catalog error: {0}")]
    Catalog(String),

    /// A stored record does not have the expected shape.
    #[error("corrupt record: {0}")]
    CorruptRecord(String),

    /// An internal lock was poisoned (a thread panicked while holding it).
    #[error("internal lock poisoned: {0}")]
    LockPoisoned(String),
}

impl GraphError {
    /// Returns `true` if the engine reported the failure.
    ///
    /// Only these errors may be worth retrying with a new transaction.
    #[must_use]
    pub const fn is_storage_fault(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Returns `true` if the caller misused the API.
    #[must_use]
    pub const fn is_usage_error(&self) -> bool {
        matches!(self, Self::Scope(_) | Self::Cursor(_) | Self::Catalog(_) | Self::Config(_))
    }

    /// Create a config error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a corrupt record error.
    #[must_use]
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::CorruptRecord(msg.into())
    }

    /// Create a lock poisoned error.
    #[must_use]
    pub fn lock_poisoned(msg: impl Into<String>) -> Self {
        Self::LockPoisoned(msg.into())
    }
}

impl From<LogicalError> for GraphError {
    fn from(err: LogicalError) -> Self {
        match err {
            LogicalError::StorageFault(e) => Self::Storage(e),
            LogicalError::KeyTooLarge { .. }
            | LogicalError::MalformedKey(_)
            | LogicalError::Conversion(_) => Self::Encoding(err.to_string()),
            LogicalError::InvalidScope(_) => Self::Scope(err.to_string()),
            LogicalError::NoCurrentElement
            | LogicalError::IllegalCursorState(_)
            | LogicalError::Closed
            | LogicalError::Unsupported(_) => Self::Cursor(err.to_string()),
            LogicalError::DuplicatePrefix { .. } | LogicalError::DuplicateName(_) => {
                Self::Catalog(err.to_string())
            }
        }
    }
}

/// A specialized `Result` type for graph store operations.
pub type GraphResult<T> = std::result::Result<T, GraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logical_errors_are_classified() {
        let err: GraphError = LogicalError::KeyTooLarge { len: 300, max: 255 }.into();
        assert!(matches!(err, GraphError::Encoding(_)));

        let err: GraphError = LogicalError::invalid_scope("get on multivalued").into();
        assert!(matches!(err, GraphError::Scope(_)));
        assert!(err.is_usage_error());

        let err: GraphError = LogicalError::NoCurrentElement.into();
        assert!(matches!(err, GraphError::Cursor(_)));

        let err: GraphError = LogicalError::DuplicateName("idx".into()).into();
        assert!(matches!(err, GraphError::Catalog(_)));

        let err: GraphError = LogicalError::StorageFault(StorageError::ReadOnly).into();
        assert!(err.is_storage_fault());
        assert!(!err.is_usage_error());
    }

    #[test]
    fn test_error_display() {
        let err = GraphError::config("in-memory store with a path");
        assert_eq!(err.to_string(), "configuration error: in-memory store with a path");

        let err = GraphError::corrupt("link record of 7 bytes");
        assert_eq!(err.to_string(), "corrupt record: link record of 7 bytes");
    }
}
