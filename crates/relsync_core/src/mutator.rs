//! Atomic relation mutations.

use crate::context::Context;
use crate::descriptor::{Cardinality, FieldDescriptor};
use crate::entity_type::{EntityType, Slot, Strategy};
use crate::error::{SyncError, SyncResult};
use relsync_model::{Record, Value};
use relsync_storage::RelationKind;
use tracing::{debug, trace};

/// Applies single-field mutations using the strategy the entity type resolves.
///
/// None of the operations are transactional: every native primitive may
/// write to storage immediately, and nothing is rolled back on failure.
pub struct RelationshipMutator<'a, E> {
    entity_type: &'a EntityType<E>,
}

impl<'a, E> RelationshipMutator<'a, E> {
    /// Creates a mutator for entities of `entity_type`.
    pub fn new(entity_type: &'a EntityType<E>) -> Self {
        Self { entity_type }
    }

    /// Points a to-one field at `value`.
    ///
    /// An override receives `value` ahead of `extra`. Without one, the native
    /// relation's `associate` is used, or the child setter slot.
    pub fn set_child(
        &self,
        entity: &mut E,
        field: &FieldDescriptor,
        value: &Record,
        extra: &[Value],
    ) -> SyncResult<()> {
        let name = field.name();
        match self.entity_type.resolve_set(name) {
            Strategy::Override(set) => {
                debug!(
                    entity_type = self.entity_type.name(),
                    field = name,
                    "set child via override"
                );
                set(entity, value, extra)
            }
            Strategy::Relation(accessor) => {
                debug!(
                    entity_type = self.entity_type.name(),
                    field = name,
                    child = %value.id(),
                    "associate"
                );
                accessor(entity).associate(value)?;
                Ok(())
            }
            Strategy::Field => self.assign_child(entity, field, Some(value.clone())),
        }
    }

    /// Clears a to-one field.
    pub fn clear_child(
        &self,
        entity: &mut E,
        field: &FieldDescriptor,
        extra: &[Value],
    ) -> SyncResult<()> {
        let name = field.name();
        match self.entity_type.resolve_clear(name) {
            Strategy::Override(clear) => {
                debug!(
                    entity_type = self.entity_type.name(),
                    field = name,
                    "clear child via override"
                );
                clear(entity, extra)
            }
            Strategy::Relation(accessor) => {
                debug!(entity_type = self.entity_type.name(), field = name, "dissociate");
                accessor(entity).dissociate()?;
                Ok(())
            }
            Strategy::Field => self.assign_child(entity, field, None),
        }
    }

    /// Adds `children` to a to-many field.
    ///
    /// Precedence: the field's add override (called once with the whole
    /// collection), the type's batch-add hook, then one native `attach` per
    /// child on a many-to-many relation.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::UnsupportedRelationType`] when the native
    /// relation is not many-to-many. An empty `children` list never reaches
    /// the native relation and always succeeds.
    pub fn add_children(
        &self,
        entity: &mut E,
        field: &FieldDescriptor,
        children: &[Record],
        extra: &[Value],
        context: &Context,
    ) -> SyncResult<()> {
        let name = field.name();
        let strategy = self.entity_type.resolve_add(name);

        if let Strategy::Override(add) = strategy {
            debug!(
                entity_type = self.entity_type.name(),
                field = name,
                count = children.len(),
                "add children via override"
            );
            return add(entity, children, extra);
        }
        if let Some(hook) = &self.entity_type.hooks().add {
            debug!(
                entity_type = self.entity_type.name(),
                field = name,
                count = children.len(),
                "add children via hook"
            );
            return hook(entity, name, children, extra, context);
        }

        let Strategy::Relation(accessor) = strategy else {
            return Err(SyncError::unknown_field(self.entity_type.name(), name));
        };
        if children.is_empty() {
            return Ok(());
        }
        let mut relation = accessor(entity)
            .ok_or_else(|| SyncError::relation_unavailable(self.entity_type.name(), name))?;
        ensure_generic_membership(name, relation.kind())?;

        debug!(
            entity_type = self.entity_type.name(),
            field = name,
            count = children.len(),
            "attach children"
        );
        for child in children {
            relation.attach(child)?;
        }
        Ok(())
    }

    /// Removes `children` from a to-many field.
    ///
    /// Mirrors [`Self::add_children`] with the remove override, the
    /// batch-remove hook and one native `detach` per child. A relation that
    /// was never materialized has no members, so there is nothing to detach.
    pub fn remove_children(
        &self,
        entity: &mut E,
        field: &FieldDescriptor,
        children: &[Record],
        extra: &[Value],
        context: &Context,
    ) -> SyncResult<()> {
        let name = field.name();
        let strategy = self.entity_type.resolve_remove(name);

        if let Strategy::Override(remove) = strategy {
            debug!(
                entity_type = self.entity_type.name(),
                field = name,
                count = children.len(),
                "remove children via override"
            );
            return remove(entity, children, extra);
        }
        if let Some(hook) = &self.entity_type.hooks().remove {
            debug!(
                entity_type = self.entity_type.name(),
                field = name,
                count = children.len(),
                "remove children via hook"
            );
            return hook(entity, name, children, extra, context);
        }

        let Strategy::Relation(accessor) = strategy else {
            return Err(SyncError::unknown_field(self.entity_type.name(), name));
        };
        if children.is_empty() {
            return Ok(());
        }
        let Some(mut relation) = accessor(entity) else {
            trace!(field = name, "relation not materialized, nothing to detach");
            return Ok(());
        };
        ensure_generic_membership(name, relation.kind())?;

        debug!(
            entity_type = self.entity_type.name(),
            field = name,
            count = children.len(),
            "detach children"
        );
        for child in children {
            relation.detach(child)?;
        }
        Ok(())
    }

    /// Assigns a scalar field.
    ///
    /// An override receives `value` ahead of `extra`; otherwise the scalar
    /// setter slot is used.
    pub fn set_value(
        &self,
        entity: &mut E,
        field: &FieldDescriptor,
        value: &Value,
        extra: &[Value],
    ) -> SyncResult<()> {
        let name = field.name();
        match self.entity_type.resolve_assign(name) {
            Strategy::Override(assign) => {
                debug!(entity_type = self.entity_type.name(), field = name, "assign via override");
                assign(entity, value, extra)
            }
            Strategy::Relation(_) | Strategy::Field => match self.entity_type.slot(name) {
                Some(Slot::Scalar(set)) => {
                    trace!(entity_type = self.entity_type.name(), field = name, "assign");
                    set(entity, value.clone());
                    Ok(())
                }
                Some(Slot::Child(_)) => Err(SyncError::CardinalityMismatch {
                    field: name.to_string(),
                    expected: Cardinality::Scalar,
                    found: Cardinality::ToOne,
                }),
                None => Err(SyncError::unknown_field(self.entity_type.name(), name)),
            },
        }
    }

    /// Hands children that were edited in place to the type's edit hook.
    ///
    /// Without a hook there is nothing left to do: the children already
    /// carry their new values.
    pub fn edit_children(
        &self,
        entity: &mut E,
        field: &FieldDescriptor,
        children: &[Record],
        extra: &[Value],
        context: &Context,
    ) -> SyncResult<()> {
        match &self.entity_type.hooks().edit {
            Some(hook) => {
                debug!(
                    entity_type = self.entity_type.name(),
                    field = field.name(),
                    count = children.len(),
                    "edit children via hook"
                );
                hook(entity, field.name(), children, extra, context)
            }
            None => {
                trace!(entity_type = self.entity_type.name(), field = field.name(), "no edit hook");
                Ok(())
            }
        }
    }

    fn assign_child(
        &self,
        entity: &mut E,
        field: &FieldDescriptor,
        value: Option<Record>,
    ) -> SyncResult<()> {
        let name = field.name();
        match self.entity_type.slot(name) {
            Some(Slot::Child(set)) => {
                trace!(
                    entity_type = self.entity_type.name(),
                    field = name,
                    cleared = value.is_none(),
                    "assign child"
                );
                set(entity, value);
                Ok(())
            }
            Some(Slot::Scalar(_)) => Err(SyncError::CardinalityMismatch {
                field: name.to_string(),
                expected: Cardinality::ToOne,
                found: Cardinality::Scalar,
            }),
            None => Err(SyncError::unknown_field(self.entity_type.name(), name)),
        }
    }
}

fn ensure_generic_membership(field: &str, kind: RelationKind) -> SyncResult<()> {
    if kind.supports_generic_membership() {
        Ok(())
    } else {
        Err(SyncError::unsupported_relation(
            field,
            kind,
            RelationKind::ManyToMany.name(),
        ))
    }
}
