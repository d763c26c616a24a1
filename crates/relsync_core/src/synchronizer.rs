//! Entity-level facade over the mutator and the reconciler.

use crate::config::EngineConfig;
use crate::context::Context;
use crate::descriptor::{Cardinality, FieldDescriptor};
use crate::entity_type::EntityType;
use crate::error::SyncResult;
use crate::identifier::Identifier;
use crate::mutator::RelationshipMutator;
use crate::reconciler::SetReconciler;
use relsync_model::{Record, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// One field-level step of an entity synchronization.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOperation {
    /// Assign a scalar field.
    SetValue {
        /// Target field.
        field: FieldDescriptor,
        /// New value.
        value: Value,
        /// Extra parameters forwarded to an override.
        extra: Vec<Value>,
    },
    /// Point a to-one field at a record.
    SetChild {
        /// Target field.
        field: FieldDescriptor,
        /// The related record.
        child: Record,
        /// Extra parameters forwarded to an override.
        extra: Vec<Value>,
    },
    /// Clear a to-one field.
    ClearChild {
        /// Target field.
        field: FieldDescriptor,
        /// Extra parameters forwarded to an override.
        extra: Vec<Value>,
    },
    /// Add members to a to-many field.
    AddChildren {
        /// Target field.
        field: FieldDescriptor,
        /// Records to add.
        children: Vec<Record>,
        /// Extra parameters forwarded to an override.
        extra: Vec<Value>,
    },
    /// Remove members from a to-many field.
    RemoveChildren {
        /// Target field.
        field: FieldDescriptor,
        /// Records to remove.
        children: Vec<Record>,
        /// Extra parameters forwarded to an override.
        extra: Vec<Value>,
    },
    /// Report members of a to-many field edited in place.
    EditChildren {
        /// Target field.
        field: FieldDescriptor,
        /// The edited records.
        children: Vec<Record>,
        /// Extra parameters forwarded to the hook.
        extra: Vec<Value>,
    },
    /// Prune a to-many field down to a keep set.
    Reconcile {
        /// Target field.
        field: FieldDescriptor,
        /// Identifiers of the members to keep.
        keep: Vec<Identifier>,
    },
}

impl FieldOperation {
    /// Returns the field this operation targets.
    pub fn field(&self) -> &FieldDescriptor {
        match self {
            Self::SetValue { field, .. }
            | Self::SetChild { field, .. }
            | Self::ClearChild { field, .. }
            | Self::AddChildren { field, .. }
            | Self::RemoveChildren { field, .. }
            | Self::EditChildren { field, .. }
            | Self::Reconcile { field, .. } => field,
        }
    }

    /// Returns a short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetValue { .. } => "set_value",
            Self::SetChild { .. } => "set_child",
            Self::ClearChild { .. } => "clear_child",
            Self::AddChildren { .. } => "add_children",
            Self::RemoveChildren { .. } => "remove_children",
            Self::EditChildren { .. } => "edit_children",
            Self::Reconcile { .. } => "reconcile",
        }
    }
}

/// Outcome of a successful [`Synchronizer::apply`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Operations executed.
    pub applied: usize,
    /// Members removed by reconciliation.
    pub removed: usize,
}

/// Synchronizes the relations of entities of one type.
///
/// Every operation checks the field's cardinality before touching storage,
/// then delegates to [`RelationshipMutator`] or [`SetReconciler`].
pub struct Synchronizer<E> {
    entity_type: Arc<EntityType<E>>,
    config: EngineConfig,
}

impl<E> Synchronizer<E> {
    /// Creates a synchronizer with the default configuration.
    pub fn new(entity_type: Arc<EntityType<E>>) -> Self {
        Self::with_config(entity_type, EngineConfig::default())
    }

    /// Creates a synchronizer with the given configuration.
    pub fn with_config(entity_type: Arc<EntityType<E>>, config: EngineConfig) -> Self {
        Self {
            entity_type,
            config,
        }
    }

    /// Returns the entity type.
    pub fn entity_type(&self) -> &EntityType<E> {
        &self.entity_type
    }

    /// Returns the configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn mutator(&self) -> RelationshipMutator<'_, E> {
        RelationshipMutator::new(&self.entity_type)
    }

    /// Assigns a scalar field.
    pub fn set_value(
        &self,
        entity: &mut E,
        field: &FieldDescriptor,
        value: &Value,
        extra: &[Value],
    ) -> SyncResult<()> {
        field.ensure_cardinality(Cardinality::Scalar)?;
        self.mutator().set_value(entity, field, value, extra)
    }

    /// Points a to-one field at `child`.
    pub fn set_child(
        &self,
        entity: &mut E,
        field: &FieldDescriptor,
        child: &Record,
        extra: &[Value],
    ) -> SyncResult<()> {
        field.ensure_cardinality(Cardinality::ToOne)?;
        self.mutator().set_child(entity, field, child, extra)
    }

    /// Clears a to-one field.
    pub fn clear_child(
        &self,
        entity: &mut E,
        field: &FieldDescriptor,
        extra: &[Value],
    ) -> SyncResult<()> {
        field.ensure_cardinality(Cardinality::ToOne)?;
        self.mutator().clear_child(entity, field, extra)
    }

    /// Adds members to a to-many field.
    pub fn add_children(
        &self,
        entity: &mut E,
        field: &FieldDescriptor,
        children: &[Record],
        extra: &[Value],
        context: &Context,
    ) -> SyncResult<()> {
        field.ensure_cardinality(Cardinality::ToMany)?;
        self.mutator()
            .add_children(entity, field, children, extra, context)
    }

    /// Removes members from a to-many field.
    pub fn remove_children(
        &self,
        entity: &mut E,
        field: &FieldDescriptor,
        children: &[Record],
        extra: &[Value],
        context: &Context,
    ) -> SyncResult<()> {
        field.ensure_cardinality(Cardinality::ToMany)?;
        self.mutator()
            .remove_children(entity, field, children, extra, context)
    }

    /// Reports members of a to-many field edited in place.
    pub fn edit_children(
        &self,
        entity: &mut E,
        field: &FieldDescriptor,
        children: &[Record],
        extra: &[Value],
        context: &Context,
    ) -> SyncResult<()> {
        field.ensure_cardinality(Cardinality::ToMany)?;
        self.mutator()
            .edit_children(entity, field, children, extra, context)
    }

    /// Prunes a to-many field down to `keep`. Returns the number removed.
    pub fn reconcile(
        &self,
        entity: &mut E,
        field: &FieldDescriptor,
        keep: &[Identifier],
        context: &Context,
    ) -> SyncResult<usize> {
        field.ensure_cardinality(Cardinality::ToMany)?;
        SetReconciler::new(&self.entity_type, &self.config).reconcile(entity, field, keep, context)
    }

    /// Executes `operations` strictly in order.
    ///
    /// Stops at the first failure and returns its error. Operations that
    /// already ran keep their effects.
    pub fn apply(
        &self,
        entity: &mut E,
        operations: &[FieldOperation],
        context: &Context,
    ) -> SyncResult<ApplyReport> {
        let mut report = ApplyReport::default();
        for (index, operation) in operations.iter().enumerate() {
            if let Err(err) = self.apply_one(entity, operation, context, &mut report) {
                warn!(
                    entity_type = self.entity_type.name(),
                    field = operation.field().name(),
                    operation = operation.name(),
                    index,
                    error = %err,
                    "synchronization aborted"
                );
                return Err(err);
            }
            report.applied += 1;
        }
        debug!(
            entity_type = self.entity_type.name(),
            applied = report.applied,
            removed = report.removed,
            "synchronization complete"
        );
        Ok(report)
    }

    fn apply_one(
        &self,
        entity: &mut E,
        operation: &FieldOperation,
        context: &Context,
        report: &mut ApplyReport,
    ) -> SyncResult<()> {
        match operation {
            FieldOperation::SetValue { field, value, extra } => {
                self.set_value(entity, field, value, extra)
            }
            FieldOperation::SetChild { field, child, extra } => {
                self.set_child(entity, field, child, extra)
            }
            FieldOperation::ClearChild { field, extra } => self.clear_child(entity, field, extra),
            FieldOperation::AddChildren {
                field,
                children,
                extra,
            } => self.add_children(entity, field, children, extra, context),
            FieldOperation::RemoveChildren {
                field,
                children,
                extra,
            } => self.remove_children(entity, field, children, extra, context),
            FieldOperation::EditChildren {
                field,
                children,
                extra,
            } => self.edit_children(entity, field, children, extra, context),
            FieldOperation::Reconcile { field, keep } => {
                report.removed += self.reconcile(entity, field, keep, context)?;
                Ok(())
            }
        }
    }
}

impl<E> std::fmt::Debug for Synchronizer<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synchronizer")
            .field("entity_type", &self.entity_type.name())
            .field("config", &self.config)
            .finish()
    }
}
