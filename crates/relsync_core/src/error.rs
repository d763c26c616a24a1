//! Error types for the synchronization engine.

use crate::descriptor::Cardinality;
use relsync_storage::{RelationKind, StorageError};
use thiserror::Error;

/// Result type for synchronization operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while applying field values onto an entity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// A to-many mutation has no generic semantics for this relation kind
    /// and no override or hook handles it.
    #[error(
        "relation `{field}` of type {found} is not supported, expected {expected} (or register an override)"
    )]
    UnsupportedRelationType {
        /// Field the mutation targeted.
        field: String,
        /// Kind of the relation that was encountered.
        found: RelationKind,
        /// Description of what would have been supported.
        expected: String,
    },

    /// A kept identifier has no usable components.
    #[error("malformed identifier for `{field}`: {reason}")]
    MalformedIdentifier {
        /// Field the identifier was given for.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The entity type has nothing registered that can carry out the operation.
    #[error("entity type `{entity_type}` has no accessor for field `{field}`")]
    UnknownField {
        /// Registered entity type name.
        entity_type: String,
        /// Field name.
        field: String,
    },

    /// The relation exists on the type but is not materialized on this instance.
    #[error("relation `{field}` is not materialized on this `{entity_type}`")]
    RelationUnavailable {
        /// Registered entity type name.
        entity_type: String,
        /// Field name.
        field: String,
    },

    /// The operation does not fit the field's cardinality.
    #[error("field `{field}` is {found}, operation requires {expected}")]
    CardinalityMismatch {
        /// Field name.
        field: String,
        /// Cardinality the operation needs.
        expected: Cardinality,
        /// Cardinality the field descriptor declares.
        found: Cardinality,
    },

    /// An override or hook rejected the operation.
    #[error("override for `{field}` failed: {message}")]
    Override {
        /// Field name.
        field: String,
        /// Message from the override.
        message: String,
    },

    /// Storage error, propagated unchanged.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl SyncError {
    /// Creates an unsupported relation type error.
    pub fn unsupported_relation(
        field: impl Into<String>,
        found: RelationKind,
        expected: impl Into<String>,
    ) -> Self {
        Self::UnsupportedRelationType {
            field: field.into(),
            found,
            expected: expected.into(),
        }
    }

    /// Creates a malformed identifier error.
    pub fn malformed_identifier(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedIdentifier {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates an unknown field error.
    pub fn unknown_field(entity_type: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            entity_type: entity_type.into(),
            field: field.into(),
        }
    }

    /// Creates a relation unavailable error.
    pub fn relation_unavailable(entity_type: impl Into<String>, field: impl Into<String>) -> Self {
        Self::RelationUnavailable {
            entity_type: entity_type.into(),
            field: field.into(),
        }
    }

    /// Creates an override failure. Meant to be returned from override closures.
    pub fn override_failed(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Override {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Returns true if this error can be retried.
    ///
    /// The engine itself never retries; this only classifies storage errors
    /// the store marked transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Storage(err) => err.is_transient(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(SyncError::from(StorageError::Unavailable("timeout".into())).is_retryable());
        assert!(!SyncError::from(StorageError::constraint_violation("dup")).is_retryable());
        assert!(!SyncError::malformed_identifier("tags", "no components").is_retryable());
    }

    #[test]
    fn unsupported_names_both_kinds() {
        let err = SyncError::unsupported_relation(
            "lines",
            RelationKind::OwnedCollection,
            RelationKind::ManyToMany.name(),
        );
        let message = err.to_string();
        assert!(message.contains("owned collection"));
        assert!(message.contains("many-to-many"));
    }

    #[test]
    fn storage_errors_pass_through() {
        let inner = StorageError::constraint_violation("fk");
        let err: SyncError = inner.clone().into();
        assert_eq!(err, SyncError::Storage(inner));
    }
}
