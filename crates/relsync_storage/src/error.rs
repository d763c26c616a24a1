//! Error types for storage operations.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during relation storage operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The store could not be reached or timed out.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A write would violate a storage constraint.
    #[error("constraint violation: {message}")]
    ConstraintViolation {
        /// Description of the violated constraint.
        message: String,
    },

    /// The relation handle does not support the requested operation.
    #[error("relation does not support {operation}")]
    Unsupported {
        /// Name of the unsupported operation.
        operation: String,
    },
}

impl StorageError {
    /// Creates a constraint violation error.
    pub fn constraint_violation(message: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            message: message.into(),
        }
    }

    /// Creates an unsupported operation error.
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    /// Returns true if retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Unavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors() {
        assert!(StorageError::Unavailable("timeout".into()).is_transient());
        assert!(!StorageError::constraint_violation("duplicate").is_transient());
        assert!(!StorageError::unsupported("filter").is_transient());
    }

    #[test]
    fn error_display() {
        let err = StorageError::unsupported("filter");
        assert_eq!(err.to_string(), "relation does not support filter");
    }
}
