//! Keep-set reconciliation of to-many relations.
//!
//! Given the identifiers a caller wants to keep, the reconciler removes every
//! current member that equals none of them and leaves the rest untouched. It
//! never adds: identifiers with no matching member are ignored.

use crate::config::EngineConfig;
use crate::context::Context;
use crate::descriptor::FieldDescriptor;
use crate::entity_type::EntityType;
use crate::error::{SyncError, SyncResult};
use crate::identifier::{Identifier, IdentifierMatcher};
use crate::mutator::RelationshipMutator;
use relsync_model::{Predicate, Record, Value};
use relsync_storage::ToManyRelation;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Prunes to-many relations down to a keep set.
pub struct SetReconciler<'a, E> {
    entity_type: &'a EntityType<E>,
    config: &'a EngineConfig,
}

impl<'a, E> SetReconciler<'a, E> {
    /// Creates a reconciler for entities of `entity_type`.
    pub fn new(entity_type: &'a EntityType<E>, config: &'a EngineConfig) -> Self {
        Self {
            entity_type,
            config,
        }
    }

    /// Removes every member of `field` not matched by an identifier in `keep`.
    ///
    /// A member is kept when it equals some kept identifier on all of that
    /// identifier's components. The selection is pushed down to the store as
    /// a [`Predicate`], so only removal candidates are fetched, and they are
    /// handed to [`RelationshipMutator::remove_children`] in one call.
    ///
    /// Returns the number of members handed to removal. A relation that was
    /// never materialized yields `0` without touching storage, whatever
    /// `keep` contains.
    ///
    /// # Errors
    ///
    /// - [`SyncError::MalformedIdentifier`] before any removal or hook call
    ///   if a kept identifier is unusable
    /// - [`SyncError::UnsupportedRelationType`] if the relation cannot
    ///   filter in the store and neither a synchronization hook nor
    ///   client-side filtering is available
    /// - storage errors, unchanged
    pub fn reconcile(
        &self,
        entity: &mut E,
        field: &FieldDescriptor,
        keep: &[Identifier],
        context: &Context,
    ) -> SyncResult<usize> {
        let name = field.name();
        let Some(accessor) = self.entity_type.to_many_accessor(name) else {
            return match &self.entity_type.hooks().synchronize {
                Some(hook) => {
                    self.component_maps(field, keep, context)?;
                    debug!(
                        entity_type = self.entity_type.name(),
                        field = name,
                        "reconcile via hook"
                    );
                    hook(entity, name, keep, context)
                }
                None => Err(SyncError::unknown_field(self.entity_type.name(), name)),
            };
        };

        let Some(relation) = accessor(entity) else {
            trace!(
                entity_type = self.entity_type.name(),
                field = name,
                "relation not materialized, nothing to remove"
            );
            return Ok(0);
        };

        let keys = self.component_maps(field, keep, context)?;
        let predicate = Predicate::excluding(&keys);

        let candidates = if keys.is_empty() {
            relation.fetch_members()?
        } else if relation.capabilities().server_side_filter {
            relation.filter(&predicate)?.fetch_members()?
        } else if let Some(hook) = &self.entity_type.hooks().synchronize {
            debug!(
                entity_type = self.entity_type.name(),
                field = name,
                "relation cannot filter, reconcile via hook"
            );
            return hook(entity, name, keep, context);
        } else if self.config.client_side_filter {
            filter_in_memory(relation.as_ref(), &predicate)?
        } else {
            return Err(SyncError::unsupported_relation(
                name,
                relation.kind(),
                "a relation with server-side filtering",
            ));
        };
        drop(relation);

        debug!(
            entity_type = self.entity_type.name(),
            field = name,
            kept = keep.len(),
            removed = candidates.len(),
            "reconciled"
        );
        if candidates.is_empty() {
            return Ok(0);
        }

        RelationshipMutator::new(self.entity_type).remove_children(
            entity,
            field,
            &candidates,
            &[],
            context,
        )?;
        Ok(candidates.len())
    }

    fn component_maps(
        &self,
        field: &FieldDescriptor,
        keep: &[Identifier],
        context: &Context,
    ) -> SyncResult<Vec<BTreeMap<String, Value>>> {
        let matcher = IdentifierMatcher::new(field, self.config.strict_components);
        keep.iter()
            .map(|identifier| matcher.to_component_map(identifier, context))
            .collect()
    }
}

fn filter_in_memory(
    relation: &dyn ToManyRelation,
    predicate: &Predicate,
) -> SyncResult<Vec<Record>> {
    Ok(relation
        .fetch_members()?
        .into_iter()
        .filter(|member| predicate.matches(member))
        .collect())
}
