//! # relsync core
//!
//! Keeps an entity's relationships in line with an incoming description of
//! them, through whatever mechanism each entity type prefers.
//!
//! This crate provides:
//! - Per-type strategy tables ([`EntityType`]): overrides, native relation
//!   accessors and direct setters, resolved most specific first
//! - Single-field mutations ([`RelationshipMutator`])
//! - Keep-set reconciliation of to-many relations ([`SetReconciler`])
//! - Identifier normalization ([`IdentifierMatcher`])
//! - An ordered, entity-level facade ([`Synchronizer`])
//!
//! ## Key Invariants
//!
//! - Reconciliation only removes, and removes exactly the members equal to
//!   no kept identifier
//! - A relation that was never materialized is left alone
//! - An override replaces the generic path entirely
//! - Malformed identifiers abort before any removal
//! - Nothing is transactional; earlier writes survive later failures
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use relsync_core::{Context, EntityType, FieldDescriptor, Identifier, Synchronizer};
//! use relsync_model::{EntityId, Record};
//! use relsync_storage::{MemoryStore, RelationKind, ToManyRelation};
//!
//! struct Order {
//!     id: EntityId,
//! }
//!
//! let store = MemoryStore::shared();
//! let order = Order { id: EntityId::from_u128(100) };
//! let tag = |n: u128| Record::new(EntityId::from_u128(n)).with("id", n as i64);
//! store.seed(order.id, "tags", vec![tag(1), tag(2), tag(3)]);
//!
//! let handles = Arc::clone(&store);
//! let orders = EntityType::builder("Order")
//!     .to_many("tags", move |o: &Order| {
//!         Some(Box::new(handles.to_many(o.id, "tags", RelationKind::ManyToMany))
//!             as Box<dyn ToManyRelation>)
//!     })
//!     .build();
//!
//! let sync = Synchronizer::new(Arc::new(orders));
//! let tags = FieldDescriptor::to_many("tags", RelationKind::ManyToMany);
//! let keep = [Identifier::of("id", 2i64), Identifier::of("id", 4i64)];
//! let mut order = order;
//! let removed = sync.reconcile(&mut order, &tags, &keep, &Context::new()).unwrap();
//!
//! assert_eq!(removed, 2);
//! assert_eq!(store.members(order.id, "tags"), vec![tag(2)]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod context;
mod descriptor;
mod entity_type;
mod error;
mod identifier;
mod mutator;
mod reconciler;
mod synchronizer;

pub use config::EngineConfig;
pub use context::Context;
pub use descriptor::{Cardinality, FieldDescriptor};
pub use entity_type::{
    AssignFn, ChildrenFn, ChildrenHookFn, ClearChildFn, EntityType, EntityTypeBuilder, Hooks,
    OperationKind, Resolution, SetChildFn, Slot, Strategy, SyncHookFn, ToManyAccessor,
    ToOneAccessor,
};
pub use error::{SyncError, SyncResult};
pub use identifier::{Identifier, IdentifierMatcher};
pub use mutator::RelationshipMutator;
pub use reconciler::SetReconciler;
pub use synchronizer::{ApplyReport, FieldOperation, Synchronizer};
