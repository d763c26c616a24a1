//! Field descriptors supplied by the resource metadata layer.

use crate::error::{SyncError, SyncResult};
use relsync_storage::RelationKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How many values a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// A plain value.
    Scalar,
    /// At most one related entity.
    ToOne,
    /// Any number of related entities.
    ToMany,
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Cardinality::Scalar => "scalar",
            Cardinality::ToOne => "to-one",
            Cardinality::ToMany => "to-many",
        })
    }
}

/// Describes one field of a resource as seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    name: String,
    cardinality: Cardinality,
    #[serde(default)]
    relation_kind: Option<RelationKind>,
    #[serde(default = "default_identifier")]
    identifier: Vec<String>,
}

fn default_identifier() -> Vec<String> {
    vec!["id".to_string()]
}

impl FieldDescriptor {
    /// Describes a scalar field.
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cardinality: Cardinality::Scalar,
            relation_kind: None,
            identifier: Vec::new(),
        }
    }

    /// Describes a to-one relation field identified by `id`.
    pub fn to_one(name: impl Into<String>, kind: RelationKind) -> Self {
        Self {
            name: name.into(),
            cardinality: Cardinality::ToOne,
            relation_kind: Some(kind),
            identifier: default_identifier(),
        }
    }

    /// Describes a to-many relation field identified by `id`.
    pub fn to_many(name: impl Into<String>, kind: RelationKind) -> Self {
        Self {
            name: name.into(),
            cardinality: Cardinality::ToMany,
            relation_kind: Some(kind),
            identifier: default_identifier(),
        }
    }

    /// Replaces the identifier shape (component names) of a relation field.
    #[must_use]
    pub fn with_identifier<I, S>(mut self, components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.identifier = components.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the field cardinality.
    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// Returns the declared relation kind, if this is a relation field.
    pub fn relation_kind(&self) -> Option<RelationKind> {
        self.relation_kind
    }

    /// Returns the component names identifying a related entity.
    pub fn identifier(&self) -> &[String] {
        &self.identifier
    }

    pub(crate) fn ensure_cardinality(&self, expected: Cardinality) -> SyncResult<()> {
        if self.cardinality == expected {
            Ok(())
        } else {
            Err(SyncError::CardinalityMismatch {
                field: self.name.clone(),
                expected,
                found: self.cardinality,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_fields_default_to_id() {
        let tags = FieldDescriptor::to_many("tags", RelationKind::ManyToMany);
        assert_eq!(tags.identifier(), ["id".to_string()]);
        assert_eq!(tags.relation_kind(), Some(RelationKind::ManyToMany));
        assert!(FieldDescriptor::scalar("status").identifier().is_empty());
    }

    #[test]
    fn composite_identifier() {
        let lines = FieldDescriptor::to_many("lines", RelationKind::OwnedCollection)
            .with_identifier(["order", "line"]);
        assert_eq!(lines.identifier(), ["order".to_string(), "line".to_string()]);
    }

    #[test]
    fn cardinality_mismatch_is_reported() {
        let status = FieldDescriptor::scalar("status");
        assert!(status.ensure_cardinality(Cardinality::Scalar).is_ok());

        let err = status.ensure_cardinality(Cardinality::ToMany).unwrap_err();
        assert_eq!(err.to_string(), "field `status` is scalar, operation requires to-many");
    }

    #[test]
    fn deserialize_from_metadata() {
        let json = r#"{"name":"tags","cardinality":"to_many","relation_kind":"many_to_many"}"#;
        let field: FieldDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(field, FieldDescriptor::to_many("tags", RelationKind::ManyToMany));
    }
}
