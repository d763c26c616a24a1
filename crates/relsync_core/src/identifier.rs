//! Composite identifiers and their translation into component maps.

use crate::context::Context;
use crate::descriptor::FieldDescriptor;
use crate::error::{SyncError, SyncResult};
use relsync_model::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A composite key naming one related entity.
///
/// Components keep the order they were decoded in; most keys have a single
/// `id` component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    components: Vec<(String, Value)>,
}

impl Identifier {
    /// Creates an identifier with no components.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a single-component identifier.
    pub fn of(component: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new().with(component, value)
    }

    /// Appends a component, builder style.
    #[must_use]
    pub fn with(mut self, component: impl Into<String>, value: impl Into<Value>) -> Self {
        self.components.push((component.into(), value.into()));
        self
    }

    /// Returns the components in order.
    pub fn components(&self) -> &[(String, Value)] {
        &self.components
    }

    /// Returns true if the identifier has no components.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Identifier {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            components: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Turns identifiers into `{entity field -> value}` maps for one field.
#[derive(Debug, Clone, Copy)]
pub struct IdentifierMatcher<'a> {
    field: &'a FieldDescriptor,
    strict: bool,
}

impl<'a> IdentifierMatcher<'a> {
    /// Creates a matcher for identifiers of `field`.
    ///
    /// In strict mode a component outside the field's identifier shape is
    /// rejected; otherwise it is kept and will simply match no member.
    pub fn new(field: &'a FieldDescriptor, strict: bool) -> Self {
        Self { field, strict }
    }

    /// Maps each component, translated through `context`, to its value.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::MalformedIdentifier`] if the identifier has no
    /// components, a component has an empty name, or (strict mode) a
    /// component is not part of the identifier shape. When two components
    /// translate to the same field, the later one wins.
    pub fn to_component_map(
        &self,
        identifier: &Identifier,
        context: &Context,
    ) -> SyncResult<BTreeMap<String, Value>> {
        let field = self.field.name();
        if identifier.is_empty() {
            return Err(SyncError::malformed_identifier(field, "identifier has no components"));
        }

        let mut map = BTreeMap::new();
        for (component, value) in identifier.components() {
            if component.is_empty() {
                return Err(SyncError::malformed_identifier(field, "component with empty name"));
            }

            let name = context.translate(component);
            if self.strict && !self.field.identifier().iter().any(|c| c == name) {
                return Err(SyncError::malformed_identifier(
                    field,
                    format!("`{name}` is not an identifier component"),
                ));
            }

            map.insert(name.to_string(), value.clone());
        }

        Ok(map)
    }
}
