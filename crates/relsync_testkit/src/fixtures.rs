//! Test fixtures.
//!
//! An `Order` entity type with a many-to-many `tags` relation, an owned
//! `notes` collection, a native `customer` to-one relation and a scalar
//! `status`, all backed by one shared [`MemoryStore`].

use parking_lot::Mutex;
use relsync_core::{
    Context, EngineConfig, EntityType, EntityTypeBuilder, FieldDescriptor, Identifier,
    SyncResult, Synchronizer,
};
use relsync_model::{EntityId, Record, Value};
use relsync_storage::{MemoryStore, RelationKind, ToManyRelation, ToOneRelation};
use std::sync::{Arc, Once};
use tracing_subscriber::EnvFilter;

/// Identity of the fixture order.
pub const ORDER_ID: EntityId = EntityId::from_u128(0x0100);

/// The fixture entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    /// Identity used to address its relations in the store.
    pub id: EntityId,
    /// False for a brand-new order whose to-many relations are unset.
    pub persisted: bool,
    /// Scalar field.
    pub status: Option<Value>,
}

impl Order {
    /// A stored order.
    pub fn persisted() -> Self {
        Self {
            id: ORDER_ID,
            persisted: true,
            status: None,
        }
    }

    /// A brand-new order.
    pub fn unsaved() -> Self {
        Self {
            persisted: false,
            ..Self::persisted()
        }
    }
}

/// A tag record whose `id` and `name` derive from `n`.
pub fn tag(n: u128) -> Record {
    Record::new(EntityId::from_u128(n))
        .with("id", n as i64)
        .with("name", format!("tag-{n}"))
}

/// Tags for each of `ns`, in order.
pub fn tags(ns: &[u128]) -> Vec<Record> {
    ns.iter().copied().map(tag).collect()
}

/// A customer record.
pub fn customer(n: u128) -> Record {
    Record::new(EntityId::from_u128(1_000 + n)).with("id", n as i64)
}

/// Descriptor of `Order.tags`.
pub fn tags_field() -> FieldDescriptor {
    FieldDescriptor::to_many("tags", RelationKind::ManyToMany)
}

/// Descriptor of `Order.notes`.
pub fn notes_field() -> FieldDescriptor {
    FieldDescriptor::to_many("notes", RelationKind::OwnedCollection)
}

/// Descriptor of `Order.customer`.
pub fn customer_field() -> FieldDescriptor {
    FieldDescriptor::to_one("customer", RelationKind::OwnedSingle)
}

/// Descriptor of `Order.status`.
pub fn status_field() -> FieldDescriptor {
    FieldDescriptor::scalar("status")
}

/// Keep-set identifiers addressing tags by `id`.
pub fn keep_ids(ns: &[u128]) -> Vec<Identifier> {
    ns.iter()
        .map(|&n| Identifier::of("id", n as i64))
        .collect()
}

/// Starts registering the `Order` type against `store`.
///
/// Callers add overrides or hooks before calling `build`.
pub fn order_type(store: &Arc<MemoryStore>) -> EntityTypeBuilder<Order> {
    let tags = Arc::clone(store);
    let notes = Arc::clone(store);
    let customer = Arc::clone(store);
    EntityType::builder("Order")
        .to_many("tags", move |order: &Order| {
            order.persisted.then(|| {
                Box::new(tags.to_many(order.id, "tags", RelationKind::ManyToMany))
                    as Box<dyn ToManyRelation>
            })
        })
        .to_many("notes", move |order: &Order| {
            order.persisted.then(|| {
                Box::new(notes.to_many(order.id, "notes", RelationKind::OwnedCollection))
                    as Box<dyn ToManyRelation>
            })
        })
        .to_one("customer", move |order: &Order| {
            Box::new(customer.to_one(order.id, "customer")) as Box<dyn ToOneRelation>
        })
        .scalar("status", |order: &mut Order, value| {
            order.status = (!value.is_null()).then_some(value);
        })
}

/// A store, the `Order` type registered against it and one order.
pub struct OrderFixture {
    /// The backing store.
    pub store: Arc<MemoryStore>,
    /// The synchronizer for `Order`.
    pub sync: Synchronizer<Order>,
    /// The order under test.
    pub order: Order,
    /// Context passed to every operation.
    pub context: Context,
}

impl OrderFixture {
    /// A persisted order with no tags.
    pub fn new() -> Self {
        let store = MemoryStore::shared();
        let ty = order_type(&store).build();
        Self::from_parts(store, ty, EngineConfig::default())
    }

    /// A persisted order whose tags are `ns`.
    pub fn with_tags(ns: &[u128]) -> Self {
        let fixture = Self::new();
        fixture.seed_tags(ns);
        fixture
    }

    /// Assembles a fixture from an already registered type.
    pub fn from_parts(
        store: Arc<MemoryStore>,
        ty: EntityType<Order>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            sync: Synchronizer::with_config(Arc::new(ty), config),
            order: Order::persisted(),
            context: Context::new(),
        }
    }

    /// Replaces the stored tags and clears the call counters.
    pub fn seed_tags(&self, ns: &[u128]) {
        self.store.seed(self.order.id, "tags", tags(ns));
        self.store.reset_stats();
    }

    /// Current tag ids, in store order.
    pub fn tag_ids(&self) -> Vec<u128> {
        self.store
            .members(self.order.id, "tags")
            .iter()
            .filter_map(|t| t.get("id").and_then(Value::as_integer))
            .map(|id| id as u128)
            .collect()
    }

    /// Reconciles `Order.tags` against tags `ns`.
    pub fn reconcile_tags(&mut self, ns: &[u128]) -> SyncResult<usize> {
        self.sync
            .reconcile(&mut self.order, &tags_field(), &keep_ids(ns), &self.context)
    }
}

impl Default for OrderFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Records every call of an override or hook.
#[derive(Debug, Clone, Default)]
pub struct CallRecorder {
    calls: Arc<Mutex<Vec<(Vec<Record>, Vec<Value>)>>>,
}

impl CallRecorder {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// A to-many override that records its arguments and succeeds.
    pub fn children_override(
        &self,
    ) -> impl Fn(&mut Order, &[Record], &[Value]) -> SyncResult<()> + Send + Sync + 'static {
        let calls = Arc::clone(&self.calls);
        move |_: &mut Order, children: &[Record], extra: &[Value]| {
            calls.lock().push((children.to_vec(), extra.to_vec()));
            Ok(())
        }
    }

    /// Recorded `(children, extra)` pairs, oldest first.
    pub fn calls(&self) -> Vec<(Vec<Record>, Vec<Value>)> {
        self.calls.lock().clone()
    }

    /// Number of recorded calls.
    pub fn count(&self) -> usize {
        self.calls.lock().len()
    }
}

static TRACING: Once = Once::new();

/// Installs a test-friendly `tracing` subscriber once per process.
///
/// Honors `RUST_LOG`; defaults to `warn`.
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_seeds_tags() {
        let fixture = OrderFixture::with_tags(&[1, 2, 3]);
        assert_eq!(fixture.tag_ids(), vec![1, 2, 3]);
        assert_eq!(fixture.store.stats().total(), 0);
    }

    #[test]
    fn unsaved_order_has_no_tags_relation() {
        let store = MemoryStore::shared();
        let ty = order_type(&store).build();
        let accessor = ty.to_many_accessor("tags").unwrap();
        assert!(accessor(&Order::unsaved()).is_none());
        assert!(accessor(&Order::persisted()).is_some());
    }
}
