//! In-memory relation store.

use crate::error::{StorageError, StorageResult};
use crate::relation::{RelationCapabilities, RelationKind, ToManyRelation, ToOneRelation};
use parking_lot::{Mutex, RwLock};
use relsync_model::{EntityId, Predicate, Record};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

type RelationKey = (EntityId, String);

/// Counters of the storage calls made through handles.
///
/// Seeding and inspection helpers on [`MemoryStore`] are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of `fetch_members` calls.
    pub fetches: u64,
    /// Number of `attach` calls.
    pub attaches: u64,
    /// Number of `detach` calls.
    pub detaches: u64,
    /// Number of `associate` calls.
    pub associates: u64,
    /// Number of `dissociate` calls.
    pub dissociates: u64,
}

impl StorageStats {
    /// Total number of write calls.
    pub fn writes(&self) -> u64 {
        self.attaches + self.detaches + self.associates + self.dissociates
    }

    /// Total number of calls, reads included.
    pub fn total(&self) -> u64 {
        self.fetches + self.writes()
    }
}

/// An in-memory relation store.
///
/// This store keeps relation contents keyed by owner and relation name and
/// is suitable for:
/// - Unit and integration tests
/// - Embedding the engine over data that lives in memory
///
/// A relation that was never seeded or materialized is reported as absent
/// by [`MemoryStore::is_materialized`], which lets accessors model a
/// brand-new entity whose relation does not exist yet.
///
/// # Thread Safety
///
/// The store is thread-safe and meant to be shared through an [`Arc`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    to_many: RwLock<HashMap<RelationKey, Vec<Record>>>,
    to_one: RwLock<HashMap<RelationKey, Record>>,
    stats: Mutex<StorageStats>,
    pending_failure: Mutex<Option<StorageError>>,
}

impl MemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new empty store behind an [`Arc`].
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Returns a queryable handle on a to-many relation.
    pub fn to_many(
        self: &Arc<Self>,
        owner: EntityId,
        relation: impl Into<String>,
        kind: RelationKind,
    ) -> MemoryToMany {
        MemoryToMany {
            store: Arc::clone(self),
            owner,
            relation: relation.into(),
            kind,
            capabilities: RelationCapabilities::queryable(),
            filter: None,
        }
    }

    /// Returns a handle on a to-one relation.
    pub fn to_one(self: &Arc<Self>, owner: EntityId, relation: impl Into<String>) -> MemoryToOne {
        MemoryToOne {
            store: Arc::clone(self),
            owner,
            relation: relation.into(),
        }
    }

    /// Replaces the members of a to-many relation, materializing it.
    pub fn seed(
        &self,
        owner: EntityId,
        relation: impl Into<String>,
        members: impl IntoIterator<Item = Record>,
    ) {
        self.to_many
            .write()
            .insert((owner, relation.into()), members.into_iter().collect());
    }

    /// Materializes an empty to-many relation if it does not exist yet.
    pub fn materialize(&self, owner: EntityId, relation: impl Into<String>) {
        self.to_many
            .write()
            .entry((owner, relation.into()))
            .or_default();
    }

    /// Returns true if the to-many relation has been seeded or materialized.
    pub fn is_materialized(&self, owner: EntityId, relation: &str) -> bool {
        self.to_many
            .read()
            .contains_key(&(owner, relation.to_string()))
    }

    /// Returns the current members of a to-many relation without counting a fetch.
    pub fn members(&self, owner: EntityId, relation: &str) -> Vec<Record> {
        self.to_many
            .read()
            .get(&(owner, relation.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the current target of a to-one relation.
    pub fn related(&self, owner: EntityId, relation: &str) -> Option<Record> {
        self.to_one
            .read()
            .get(&(owner, relation.to_string()))
            .cloned()
    }

    /// Returns a snapshot of the call counters.
    pub fn stats(&self) -> StorageStats {
        *self.stats.lock()
    }

    /// Resets the call counters.
    pub fn reset_stats(&self) {
        *self.stats.lock() = StorageStats::default();
    }

    /// Makes the next write through any handle fail with `error`.
    pub fn fail_next_write(&self, error: StorageError) {
        *self.pending_failure.lock() = Some(error);
    }

    fn check_write(&self) -> StorageResult<()> {
        match self.pending_failure.lock().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn record(&self, update: impl FnOnce(&mut StorageStats)) {
        update(&mut self.stats.lock());
    }
}

/// A to-many handle over a [`MemoryStore`] relation.
#[derive(Debug, Clone)]
pub struct MemoryToMany {
    store: Arc<MemoryStore>,
    owner: EntityId,
    relation: String,
    kind: RelationKind,
    capabilities: RelationCapabilities,
    filter: Option<Predicate>,
}

impl MemoryToMany {
    /// Overrides the capabilities of this handle.
    ///
    /// Used to model relations that cannot evaluate predicates in the store.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: RelationCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Returns the filter this handle carries, if any.
    pub fn current_filter(&self) -> Option<&Predicate> {
        self.filter.as_ref()
    }

    fn key(&self) -> RelationKey {
        (self.owner, self.relation.clone())
    }
}

impl ToManyRelation for MemoryToMany {
    fn kind(&self) -> RelationKind {
        self.kind
    }

    fn capabilities(&self) -> RelationCapabilities {
        self.capabilities
    }

    fn fetch_members(&self) -> StorageResult<Vec<Record>> {
        self.store.record(|s| s.fetches += 1);
        let relations = self.store.to_many.read();
        let members = relations.get(&self.key()).map_or(&[][..], Vec::as_slice);

        Ok(match &self.filter {
            Some(predicate) => members
                .iter()
                .filter(|m| predicate.matches(m))
                .cloned()
                .collect(),
            None => members.to_vec(),
        })
    }

    fn filter(&self, predicate: &Predicate) -> StorageResult<Box<dyn ToManyRelation>> {
        if !self.capabilities.server_side_filter {
            return Err(StorageError::unsupported("server-side filter"));
        }

        let combined = match &self.filter {
            Some(existing) => existing.clone().and(predicate.clone()),
            None => predicate.clone(),
        };

        Ok(Box::new(Self {
            filter: Some(combined),
            ..self.clone()
        }))
    }

    fn attach(&mut self, child: &Record) -> StorageResult<()> {
        self.store.check_write()?;
        self.store.record(|s| s.attaches += 1);

        let mut relations = self.store.to_many.write();
        let members = relations.entry(self.key()).or_default();
        if members.iter().any(|m| m.id() == child.id()) {
            return Err(StorageError::constraint_violation(format!(
                "{} is already attached to {}",
                child.id(),
                self.relation
            )));
        }

        trace!(relation = %self.relation, child = %child.id(), "attach");
        members.push(child.clone());
        Ok(())
    }

    fn detach(&mut self, child: &Record) -> StorageResult<()> {
        self.store.check_write()?;
        self.store.record(|s| s.detaches += 1);

        if let Some(members) = self.store.to_many.write().get_mut(&self.key()) {
            trace!(relation = %self.relation, child = %child.id(), "detach");
            members.retain(|m| m.id() != child.id());
        }
        Ok(())
    }
}

/// A to-one handle over a [`MemoryStore`] relation.
#[derive(Debug, Clone)]
pub struct MemoryToOne {
    store: Arc<MemoryStore>,
    owner: EntityId,
    relation: String,
}

impl ToOneRelation for MemoryToOne {
    fn associate(&mut self, child: &Record) -> StorageResult<()> {
        self.store.check_write()?;
        self.store.record(|s| s.associates += 1);
        self.store
            .to_one
            .write()
            .insert((self.owner, self.relation.clone()), child.clone());
        Ok(())
    }

    fn dissociate(&mut self) -> StorageResult<()> {
        self.store.check_write()?;
        self.store.record(|s| s.dissociates += 1);
        self.store
            .to_one
            .write()
            .remove(&(self.owner, self.relation.clone()));
        Ok(())
    }
}
