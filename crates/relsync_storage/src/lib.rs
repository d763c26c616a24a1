//! # relsync storage
//!
//! The narrow relation interface the synchronization engine consumes, and an
//! in-memory implementation of it.
//!
//! ## Design Principles
//!
//! - Handles are live references to one relation of one entity instance
//! - Filtering is lazy: [`ToManyRelation::filter`] returns a new handle and
//!   only [`ToManyRelation::fetch_members`] reads
//! - Capabilities are fixed when a handle is constructed
//! - Every `attach`, `detach`, `associate` and `dissociate` may write
//!   immediately; nothing here batches or rolls back
//!
//! ## Example
//!
//! ```rust
//! use relsync_model::{EntityId, Record};
//! use relsync_storage::{MemoryStore, RelationKind, ToManyRelation};
//!
//! let store = MemoryStore::shared();
//! let order = EntityId::from_u128(100);
//! let mut tags = store.to_many(order, "tags", RelationKind::ManyToMany);
//! tags.attach(&Record::new(EntityId::from_u128(1)).with("id", 1i64)).unwrap();
//! assert_eq!(tags.fetch_members().unwrap().len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod memory;
mod relation;

pub use error::{StorageError, StorageResult};
pub use memory::{MemoryStore, MemoryToMany, MemoryToOne, StorageStats};
pub use relation::{RelationCapabilities, RelationKind, ToManyRelation, ToOneRelation};
