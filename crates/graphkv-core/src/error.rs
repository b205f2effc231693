//! Error types for the core crate.

use graphkv_storage::StorageError;
use thiserror::Error;

/// Errors raised by the codec, logical databases and result sets.
#[derive(Debug, Error)]
pub enum LogicalError {
    /// A logical key does not fit the one-byte length tag.
    #[error("logical key of {len} bytes exceeds the maximum of {max}")]
    KeyTooLarge {
        /// Length of the rejected key.
        len: usize,
        /// Largest encodable length.
        max: usize,
    },

    /// A value was given to a single-valued database, or omitted for a
    /// multivalued one.
    #[error("invalid scope: {0}")]
    InvalidScope(String),

    /// `current()` was called while not positioned on an element.
    #[error("no current element")]
    NoCurrentElement,

    /// A cursor operation was called in a state that does not allow it.
    #[error("illegal cursor state: {0}")]
    IllegalCursorState(String),

    /// The result set was used after `close()`.
    #[error("result set is closed")]
    Closed,

    /// The storage engine reported a failure.
    #[error("storage fault: {0}")]
    StorageFault(#[from] StorageError),

    /// A physical key does not follow the expected layout.
    #[error("malformed physical key: {0}")]
    MalformedKey(String),

    /// A byte converter could not decode a value.
    #[error("conversion error: {0}")]
    Conversion(String),

    /// The operation is not supported by this result set.
    #[error("operation not supported: {0}")]
    Unsupported(String),

    /// Two logical databases claim the same prefix.
    #[error("prefix {prefix:#04x} is already used by '{existing}'")]
    DuplicatePrefix {
        /// The contested prefix.
        prefix: u8,
        /// Name of the database already holding it.
        existing: String,
    },

    /// Two logical databases claim the same name.
    #[error("a logical database named '{0}' is already registered")]
    DuplicateName(String),
}

impl LogicalError {
    /// Creates an invalid scope error.
    #[must_use]
    pub fn invalid_scope(message: impl Into<String>) -> Self {
        Self::InvalidScope(message.into())
    }

    /// Creates an illegal cursor state error.
    #[must_use]
    pub fn illegal_state(message: impl Into<String>) -> Self {
        Self::IllegalCursorState(message.into())
    }

    /// Creates a malformed key error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedKey(message.into())
    }

    /// Whether the error came from the storage engine.
    #[must_use]
    pub const fn is_storage_fault(&self) -> bool {
        matches!(self, Self::StorageFault(_))
    }

    /// Whether the error signals a programming error in the caller.
    #[must_use]
    pub const fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidScope(_)
                | Self::NoCurrentElement
                | Self::IllegalCursorState(_)
                | Self::Closed
                | Self::Unsupported(_)
        )
    }
}

/// Result type alias for core operations.
pub type LogicalResult<T> = Result<T, LogicalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = LogicalError::KeyTooLarge { len: 300, max: 255 };
        assert_eq!(err.to_string(), "logical key of 300 bytes exceeds the maximum of 255");

        let err = LogicalError::DuplicatePrefix { prefix: 2, existing: "incidence".into() };
        assert_eq!(err.to_string(), "prefix 0x02 is already used by 'incidence'");
    }

    #[test]
    fn test_classification() {
        let fault = LogicalError::from(StorageError::Internal("disk".into()));
        assert!(fault.is_storage_fault());
        assert!(!fault.is_usage_error());
        assert!(LogicalError::NoCurrentElement.is_usage_error());
        assert!(!LogicalError::Conversion("x".into()).is_usage_error());
    }
}
