//! Relation handle traits.

use crate::error::StorageResult;
use relsync_model::{Predicate, Record};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of native relation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// A single related entity owned through a foreign key (belongs-to / has-one).
    OwnedSingle,
    /// A collection of entities that each point back at the owner (has-many).
    OwnedCollection,
    /// A collection joined through a pivot table.
    ManyToMany,
}

impl RelationKind {
    /// Returns true if members can be attached and detached one by one
    /// without touching the members themselves.
    ///
    /// Only pivot-backed relations qualify: detaching a has-many member would
    /// have to orphan or delete the child row.
    pub fn supports_generic_membership(self) -> bool {
        matches!(self, RelationKind::ManyToMany)
    }

    /// Stable lowercase name used in messages.
    pub fn name(self) -> &'static str {
        match self {
            RelationKind::OwnedSingle => "owned single",
            RelationKind::OwnedCollection => "owned collection",
            RelationKind::ManyToMany => "many-to-many",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a relation handle can do, decided when the handle is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationCapabilities {
    /// The handle evaluates predicates in the store, so
    /// [`ToManyRelation::filter`] may be called.
    pub server_side_filter: bool,
}

impl RelationCapabilities {
    /// Capabilities of a fully queryable relation.
    pub const fn queryable() -> Self {
        Self {
            server_side_filter: true,
        }
    }

    /// Capabilities of a relation that can only be read whole.
    pub const fn opaque() -> Self {
        Self {
            server_side_filter: false,
        }
    }
}

impl Default for RelationCapabilities {
    fn default() -> Self {
        Self::queryable()
    }
}

/// A live to-many relation of one entity instance.
///
/// # Invariants
///
/// - `fetch_members` reflects the store at call time; nothing is cached
/// - `filter` never reads; it narrows a new handle
/// - `attach` and `detach` may write immediately
pub trait ToManyRelation: Send + Sync {
    /// Returns the native kind of this relation.
    fn kind(&self) -> RelationKind;

    /// Returns the capabilities fixed at construction.
    fn capabilities(&self) -> RelationCapabilities;

    /// Fetches the current members matching this handle's filter.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn fetch_members(&self) -> StorageResult<Vec<Record>>;

    /// Returns a handle narrowed by `predicate`, in addition to any filter
    /// this handle already carries.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::Unsupported`] if the handle lacks the
    /// server-side filter capability.
    fn filter(&self, predicate: &Predicate) -> StorageResult<Box<dyn ToManyRelation>>;

    /// Adds a member to the relation.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or violates a constraint.
    fn attach(&mut self, child: &Record) -> StorageResult<()>;

    /// Removes a member from the relation. Removing a non-member is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn detach(&mut self, child: &Record) -> StorageResult<()>;
}

/// A live to-one relation of one entity instance.
pub trait ToOneRelation: Send + Sync {
    /// Points the relation at `child`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn associate(&mut self, child: &Record) -> StorageResult<()>;

    /// Clears the relation.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn dissociate(&mut self) -> StorageResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_many_to_many_has_generic_membership() {
        assert!(RelationKind::ManyToMany.supports_generic_membership());
        assert!(!RelationKind::OwnedCollection.supports_generic_membership());
        assert!(!RelationKind::OwnedSingle.supports_generic_membership());
    }

    #[test]
    fn kind_display() {
        assert_eq!(RelationKind::ManyToMany.to_string(), "many-to-many");
        assert_eq!(RelationKind::OwnedCollection.to_string(), "owned collection");
    }

    #[test]
    fn kind_serde_names() {
        let json = serde_json::to_string(&RelationKind::ManyToMany).unwrap();
        assert_eq!(json, "\"many_to_many\"");
    }

    #[test]
    fn default_capabilities_are_queryable() {
        assert!(RelationCapabilities::default().server_side_filter);
        assert!(!RelationCapabilities::opaque().server_side_filter);
    }
}
