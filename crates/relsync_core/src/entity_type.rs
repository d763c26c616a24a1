//! Per-entity-type strategy tables.
//!
//! An [`EntityType`] is registered once per domain type and records, for
//! every field, what the engine may do with it: type-specific overrides per
//! `(field, operation)`, native relation accessors, direct setters and
//! type-wide hooks. Resolution is a table lookup, most specific first:
//!
//! 1. an override registered for the field and operation
//! 2. a native relation accessor registered under the field name
//! 3. direct assignment through the field's setter slot

use crate::context::Context;
use crate::error::SyncResult;
use crate::identifier::Identifier;
use relsync_model::{Record, Value};
use relsync_storage::{ToManyRelation, ToOneRelation};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Override replacing the generic "set" of a to-one field.
pub type SetChildFn<E> = Arc<dyn Fn(&mut E, &Record, &[Value]) -> SyncResult<()> + Send + Sync>;
/// Override replacing the generic "clear" of a to-one field.
pub type ClearChildFn<E> = Arc<dyn Fn(&mut E, &[Value]) -> SyncResult<()> + Send + Sync>;
/// Override replacing the generic "add" or "remove" of a to-many field.
pub type ChildrenFn<E> = Arc<dyn Fn(&mut E, &[Record], &[Value]) -> SyncResult<()> + Send + Sync>;
/// Override replacing direct assignment of a scalar field.
pub type AssignFn<E> = Arc<dyn Fn(&mut E, &Value, &[Value]) -> SyncResult<()> + Send + Sync>;

/// Produces the live to-one relation of an entity.
pub type ToOneAccessor<E> = Arc<dyn Fn(&E) -> Box<dyn ToOneRelation> + Send + Sync>;
/// Produces the live to-many relation of an entity, or `None` when the
/// relation has never been materialized (e.g. a brand-new entity).
pub type ToManyAccessor<E> = Arc<dyn Fn(&E) -> Option<Box<dyn ToManyRelation>> + Send + Sync>;

/// Type-wide hook handling every to-many field of the type.
pub type ChildrenHookFn<E> =
    Arc<dyn Fn(&mut E, &str, &[Record], &[Value], &Context) -> SyncResult<()> + Send + Sync>;
/// Type-wide hook taking over reconciliation; returns how many members it removed.
pub type SyncHookFn<E> =
    Arc<dyn Fn(&mut E, &str, &[Identifier], &Context) -> SyncResult<usize> + Send + Sync>;

/// The kind of mutation being resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Point a to-one relation at an entity.
    Set,
    /// Clear a to-one relation.
    Clear,
    /// Add members to a to-many relation.
    Add,
    /// Remove members from a to-many relation.
    Remove,
    /// Assign a scalar value.
    Assign,
}

/// The outcome of resolving one `(field, operation)` pair.
pub enum Strategy<'a, F: ?Sized, A: ?Sized> {
    /// A type-specific override handles the operation.
    Override(&'a F),
    /// Generic: delegate to the native relation behind this accessor.
    Relation(&'a A),
    /// Generic: assign or clear the field directly.
    Field,
}

impl<F: ?Sized, A: ?Sized> Clone for Strategy<'_, F, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<F: ?Sized, A: ?Sized> Copy for Strategy<'_, F, A> {}

impl<F: ?Sized, A: ?Sized> Strategy<'_, F, A> {
    /// Drops the borrowed target, keeping only which rule matched.
    pub fn resolution(&self) -> Resolution {
        match self {
            Strategy::Override(_) => Resolution::Override,
            Strategy::Relation(_) => Resolution::GenericRelation,
            Strategy::Field => Resolution::GenericField,
        }
    }
}

/// Which resolution rule matched, without the target itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// A type-specific override.
    Override,
    /// The native relation primitive.
    GenericRelation,
    /// Direct field assignment.
    GenericField,
}

/// Direct setter for one field.
pub enum Slot<E> {
    /// Setter for a scalar value.
    Scalar(Arc<dyn Fn(&mut E, Value) + Send + Sync>),
    /// Setter for a to-one child held on the entity itself; `None` clears it.
    Child(Arc<dyn Fn(&mut E, Option<Record>) + Send + Sync>),
}

/// Type-wide hooks, consulted after overrides and before native relations.
pub struct Hooks<E> {
    /// Bespoke batch add.
    pub add: Option<ChildrenHookFn<E>>,
    /// Bespoke batch remove.
    pub remove: Option<ChildrenHookFn<E>>,
    /// Bespoke handling of children edited in place.
    pub edit: Option<ChildrenHookFn<E>>,
    /// Bespoke reconciliation for relations the engine cannot filter.
    pub synchronize: Option<SyncHookFn<E>>,
}

impl<E> Default for Hooks<E> {
    fn default() -> Self {
        Self {
            add: None,
            remove: None,
            edit: None,
            synchronize: None,
        }
    }
}

struct Overrides<E> {
    set: HashMap<String, SetChildFn<E>>,
    clear: HashMap<String, ClearChildFn<E>>,
    add: HashMap<String, ChildrenFn<E>>,
    remove: HashMap<String, ChildrenFn<E>>,
    assign: HashMap<String, AssignFn<E>>,
}

impl<E> Default for Overrides<E> {
    fn default() -> Self {
        Self {
            set: HashMap::new(),
            clear: HashMap::new(),
            add: HashMap::new(),
            remove: HashMap::new(),
            assign: HashMap::new(),
        }
    }
}

/// Registered description of one entity type.
///
/// Built once through [`EntityType::builder`] and immutable afterwards.
pub struct EntityType<E> {
    name: String,
    overrides: Overrides<E>,
    to_one: HashMap<String, ToOneAccessor<E>>,
    to_many: HashMap<String, ToManyAccessor<E>>,
    slots: HashMap<String, Slot<E>>,
    hooks: Hooks<E>,
}

impl<E> EntityType<E> {
    /// Starts registering an entity type.
    pub fn builder(name: impl Into<String>) -> EntityTypeBuilder<E> {
        EntityTypeBuilder {
            inner: EntityType {
                name: name.into(),
                overrides: Overrides::default(),
                to_one: HashMap::new(),
                to_many: HashMap::new(),
                slots: HashMap::new(),
                hooks: Hooks::default(),
            },
        }
    }

    /// Returns the registered type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the type-wide hooks.
    pub fn hooks(&self) -> &Hooks<E> {
        &self.hooks
    }

    /// Returns the direct setter registered for `field`.
    pub fn slot(&self, field: &str) -> Option<&Slot<E>> {
        self.slots.get(field)
    }

    /// Returns the to-many accessor registered for `field`.
    pub fn to_many_accessor(&self, field: &str) -> Option<&ToManyAccessor<E>> {
        self.to_many.get(field)
    }

    /// Resolves the strategy for setting a to-one field.
    pub fn resolve_set(&self, field: &str) -> Strategy<'_, SetChildFn<E>, ToOneAccessor<E>> {
        pick(self.overrides.set.get(field), self.to_one.get(field))
    }

    /// Resolves the strategy for clearing a to-one field.
    pub fn resolve_clear(&self, field: &str) -> Strategy<'_, ClearChildFn<E>, ToOneAccessor<E>> {
        pick(self.overrides.clear.get(field), self.to_one.get(field))
    }

    /// Resolves the strategy for adding to a to-many field.
    pub fn resolve_add(&self, field: &str) -> Strategy<'_, ChildrenFn<E>, ToManyAccessor<E>> {
        pick(self.overrides.add.get(field), self.to_many.get(field))
    }

    /// Resolves the strategy for removing from a to-many field.
    pub fn resolve_remove(&self, field: &str) -> Strategy<'_, ChildrenFn<E>, ToManyAccessor<E>> {
        pick(self.overrides.remove.get(field), self.to_many.get(field))
    }

    /// Resolves the strategy for assigning a scalar field. Never yields
    /// [`Strategy::Relation`].
    pub fn resolve_assign(&self, field: &str) -> Strategy<'_, AssignFn<E>, ToOneAccessor<E>> {
        pick(self.overrides.assign.get(field), None)
    }

    /// Resolves which rule applies to `(field, kind)`.
    pub fn resolve(&self, field: &str, kind: OperationKind) -> Resolution {
        match kind {
            OperationKind::Set => self.resolve_set(field).resolution(),
            OperationKind::Clear => self.resolve_clear(field).resolution(),
            OperationKind::Add => self.resolve_add(field).resolution(),
            OperationKind::Remove => self.resolve_remove(field).resolution(),
            OperationKind::Assign => self.resolve_assign(field).resolution(),
        }
    }
}

fn pick<'a, F: ?Sized, A: ?Sized>(
    overridden: Option<&'a F>,
    relation: Option<&'a A>,
) -> Strategy<'a, F, A> {
    match (overridden, relation) {
        (Some(f), _) => Strategy::Override(f),
        (None, Some(accessor)) => Strategy::Relation(accessor),
        (None, None) => Strategy::Field,
    }
}

impl<E> fmt::Debug for EntityType<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn keys<V>(map: &HashMap<String, V>) -> Vec<&str> {
            let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
            keys.sort_unstable();
            keys
        }

        f.debug_struct("EntityType")
            .field("name", &self.name)
            .field("set_overrides", &keys(&self.overrides.set))
            .field("clear_overrides", &keys(&self.overrides.clear))
            .field("add_overrides", &keys(&self.overrides.add))
            .field("remove_overrides", &keys(&self.overrides.remove))
            .field("assign_overrides", &keys(&self.overrides.assign))
            .field("to_one", &keys(&self.to_one))
            .field("to_many", &keys(&self.to_many))
            .field("slots", &keys(&self.slots))
            .finish_non_exhaustive()
    }
}

/// Builder for [`EntityType`].
pub struct EntityTypeBuilder<E> {
    inner: EntityType<E>,
}

impl<E> EntityTypeBuilder<E> {
    /// Registers an override for setting the to-one field `field`.
    #[must_use]
    pub fn on_set<F>(mut self, field: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut E, &Record, &[Value]) -> SyncResult<()> + Send + Sync + 'static,
    {
        self.inner.overrides.set.insert(field.into(), Arc::new(f));
        self
    }

    /// Registers an override for clearing the to-one field `field`.
    #[must_use]
    pub fn on_clear<F>(mut self, field: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut E, &[Value]) -> SyncResult<()> + Send + Sync + 'static,
    {
        self.inner.overrides.clear.insert(field.into(), Arc::new(f));
        self
    }

    /// Registers an override for adding members to `field`.
    #[must_use]
    pub fn on_add<F>(mut self, field: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut E, &[Record], &[Value]) -> SyncResult<()> + Send + Sync + 'static,
    {
        self.inner.overrides.add.insert(field.into(), Arc::new(f));
        self
    }

    /// Registers an override for removing members from `field`.
    #[must_use]
    pub fn on_remove<F>(mut self, field: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut E, &[Record], &[Value]) -> SyncResult<()> + Send + Sync + 'static,
    {
        self.inner.overrides.remove.insert(field.into(), Arc::new(f));
        self
    }

    /// Registers an override for assigning the scalar field `field`.
    #[must_use]
    pub fn on_assign<F>(mut self, field: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut E, &Value, &[Value]) -> SyncResult<()> + Send + Sync + 'static,
    {
        self.inner.overrides.assign.insert(field.into(), Arc::new(f));
        self
    }

    /// Registers the native to-one relation behind `field`.
    #[must_use]
    pub fn to_one<F>(mut self, field: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&E) -> Box<dyn ToOneRelation> + Send + Sync + 'static,
    {
        self.inner.to_one.insert(field.into(), Arc::new(accessor));
        self
    }

    /// Registers the native to-many relation behind `field`.
    #[must_use]
    pub fn to_many<F>(mut self, field: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&E) -> Option<Box<dyn ToManyRelation>> + Send + Sync + 'static,
    {
        self.inner.to_many.insert(field.into(), Arc::new(accessor));
        self
    }

    /// Registers a direct setter for the scalar field `field`.
    #[must_use]
    pub fn scalar<F>(mut self, field: impl Into<String>, setter: F) -> Self
    where
        F: Fn(&mut E, Value) + Send + Sync + 'static,
    {
        self.inner
            .slots
            .insert(field.into(), Slot::Scalar(Arc::new(setter)));
        self
    }

    /// Registers a direct setter for a to-one child stored on the entity.
    #[must_use]
    pub fn child<F>(mut self, field: impl Into<String>, setter: F) -> Self
    where
        F: Fn(&mut E, Option<Record>) + Send + Sync + 'static,
    {
        self.inner
            .slots
            .insert(field.into(), Slot::Child(Arc::new(setter)));
        self
    }

    /// Registers the type-wide batch-add hook.
    #[must_use]
    pub fn batch_add_hook<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut E, &str, &[Record], &[Value], &Context) -> SyncResult<()>
            + Send
            + Sync
            + 'static,
    {
        self.inner.hooks.add = Some(Arc::new(f));
        self
    }

    /// Registers the type-wide batch-remove hook.
    #[must_use]
    pub fn batch_remove_hook<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut E, &str, &[Record], &[Value], &Context) -> SyncResult<()>
            + Send
            + Sync
            + 'static,
    {
        self.inner.hooks.remove = Some(Arc::new(f));
        self
    }

    /// Registers the type-wide hook for children edited in place.
    #[must_use]
    pub fn edit_hook<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut E, &str, &[Record], &[Value], &Context) -> SyncResult<()>
            + Send
            + Sync
            + 'static,
    {
        self.inner.hooks.edit = Some(Arc::new(f));
        self
    }

    /// Registers the type-wide reconciliation hook.
    #[must_use]
    pub fn sync_hook<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut E, &str, &[Identifier], &Context) -> SyncResult<usize> + Send + Sync + 'static,
    {
        self.inner.hooks.synchronize = Some(Arc::new(f));
        self
    }

    /// Finishes registration.
    pub fn build(self) -> EntityType<E> {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relsync_model::EntityId;
    use relsync_storage::{MemoryStore, RelationKind};

    struct Order {
        id: EntityId,
        status: Option<Value>,
    }

    fn order_type() -> EntityType<Order> {
        let store = MemoryStore::shared();
        EntityType::builder("Order")
            .on_add("tags", |_order: &mut Order, _children: &[Record], _extra: &[Value]| Ok(()))
            .to_many("tags", move |order: &Order| {
                Some(Box::new(store.to_many(order.id, "tags", RelationKind::ManyToMany))
                    as Box<dyn ToManyRelation>)
            })
            .scalar("status", |order: &mut Order, value| order.status = Some(value))
            .build()
    }

    #[test]
    fn override_beats_relation() {
        let ty = order_type();
        assert_eq!(ty.resolve("tags", OperationKind::Add), Resolution::Override);
        assert_eq!(ty.resolve("tags", OperationKind::Remove), Resolution::GenericRelation);
    }

    #[test]
    fn unknown_fields_fall_back_to_direct_assignment() {
        let ty = order_type();
        assert_eq!(ty.resolve("status", OperationKind::Assign), Resolution::GenericField);
        assert_eq!(ty.resolve("customer", OperationKind::Set), Resolution::GenericField);
    }

    #[test]
    fn to_many_accessor_does_not_cover_to_one_operations() {
        let ty = order_type();
        assert_eq!(ty.resolve("tags", OperationKind::Set), Resolution::GenericField);
    }

    #[test]
    fn assign_never_resolves_to_a_relation() {
        let store = MemoryStore::shared();
        let ty: EntityType<Order> = EntityType::builder("Order")
            .to_one("status", move |order: &Order| {
                Box::new(store.to_one(order.id, "status")) as Box<dyn ToOneRelation>
            })
            .build();
        assert_eq!(ty.resolve("status", OperationKind::Assign), Resolution::GenericField);
    }

    #[test]
    fn scalar_slot_is_invocable() {
        let ty = order_type();
        let mut order = Order {
            id: EntityId::from_u128(1),
            status: None,
        };
        match ty.slot("status") {
            Some(Slot::Scalar(set)) => set(&mut order, Value::from("paid")),
            _ => panic!("expected scalar slot"),
        }
        assert_eq!(order.status, Some(Value::from("paid")));
    }

    #[test]
    fn debug_lists_registered_fields() {
        let rendered = format!("{:?}", order_type());
        assert!(rendered.contains("Order"));
        assert!(rendered.contains("tags"));
        assert!(rendered.contains("status"));
    }
}
