//! Related entity records.

use crate::id::EntityId;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A related entity as seen through a relation.
///
/// Members fetched from a relation handle and children handed to mutation
/// operations are records: the persisted identity plus the named field
/// values predicates are evaluated against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    id: EntityId,
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Creates a record with no fields.
    #[must_use]
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            fields: BTreeMap::new(),
        }
    }

    /// Adds or replaces a field, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Returns the persisted identity of this record.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Looks up a field value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Sets a field value, returning the previous one.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    /// Iterates over all fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_and_lookup() {
        let record = Record::new(EntityId::from_u128(1))
            .with("id", 1i64)
            .with("label", "red");

        assert_eq!(record.id(), EntityId::from_u128(1));
        assert_eq!(record.get("id"), Some(&Value::Integer(1)));
        assert_eq!(record.get("label"), Some(&Value::from("red")));
        assert_eq!(record.get("missing"), None);
    }

    #[test]
    fn set_replaces() {
        let mut record = Record::new(EntityId::from_u128(1)).with("rank", 1i64);
        let previous = record.set("rank", 2i64);
        assert_eq!(previous, Some(Value::Integer(1)));
        assert_eq!(record.get("rank"), Some(&Value::Integer(2)));
    }

    #[test]
    fn fields_are_name_ordered() {
        let record = Record::new(EntityId::from_u128(1))
            .with("z", 1i64)
            .with("a", 2i64);
        let names: Vec<&str> = record.fields().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["a", "z"]);
    }
}
