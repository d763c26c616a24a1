//! End-to-end synchronization scenarios over the `Order` fixture.

use relsync_core::{
    Context, EngineConfig, FieldOperation, Identifier, OperationKind, Resolution, SyncError,
};
use relsync_model::{Record, Value};
use relsync_storage::{MemoryStore, RelationKind, StorageError};
use relsync_testkit::prelude::*;

#[test]
fn keep_set_removes_only_the_rest() {
    init_test_tracing();
    let mut fixture = OrderFixture::with_tags(&[1, 2, 3]);

    let removed = fixture.reconcile_tags(&[2, 4]).unwrap();

    assert_eq!(removed, 2);
    assert_eq!(fixture.tag_ids(), vec![2]);
    let stats = fixture.store.stats();
    assert_eq!(stats.attaches, 0);
    assert_eq!(stats.detaches, 2);
}

#[test]
fn empty_keep_set_removes_everything() {
    let mut fixture = OrderFixture::with_tags(&[1, 2, 3]);

    let removed = fixture.reconcile_tags(&[]).unwrap();

    assert_eq!(removed, 3);
    assert!(fixture.tag_ids().is_empty());
}

#[test]
fn unset_relation_is_left_alone() {
    let mut fixture = OrderFixture::with_tags(&[1, 2, 3]);
    fixture.order = Order::unsaved();

    let removed = fixture.reconcile_tags(&[2]).unwrap();

    assert_eq!(removed, 0);
    assert_eq!(fixture.store.stats().total(), 0);
}

#[test]
fn second_reconcile_removes_nothing() {
    let mut fixture = OrderFixture::with_tags(&[1, 2, 3, 4]);

    assert_eq!(fixture.reconcile_tags(&[1, 3]).unwrap(), 2);
    assert_eq!(fixture.reconcile_tags(&[1, 3]).unwrap(), 0);
    assert_eq!(fixture.tag_ids(), vec![1, 3]);
}

#[test]
fn add_override_replaces_generic_attach() {
    let store = MemoryStore::shared();
    let recorder = CallRecorder::new();
    let ty = order_type(&store)
        .on_add("tags", recorder.children_override())
        .build();
    assert_eq!(ty.resolve("tags", OperationKind::Add), Resolution::Override);
    let mut fixture = OrderFixture::from_parts(store, ty, EngineConfig::default());

    fixture
        .sync
        .add_children(
            &mut fixture.order,
            &tags_field(),
            &tags(&[5, 6]),
            &[],
            &Context::new(),
        )
        .unwrap();

    assert_eq!(recorder.calls(), vec![(tags(&[5, 6]), vec![])]);
    assert_eq!(fixture.store.stats().attaches, 0);
    assert!(fixture.tag_ids().is_empty());
}

#[test]
fn remove_override_receives_reconcile_candidates() {
    let store = MemoryStore::shared();
    let recorder = CallRecorder::new();
    let ty = order_type(&store)
        .on_remove("tags", recorder.children_override())
        .build();
    let mut fixture = OrderFixture::from_parts(store, ty, EngineConfig::default());
    fixture.seed_tags(&[1, 2, 3]);

    let removed = fixture.reconcile_tags(&[2]).unwrap();

    assert_eq!(removed, 2);
    assert_eq!(recorder.calls(), vec![(tags(&[1, 3]), vec![])]);
    assert_eq!(fixture.store.stats().detaches, 0);
}

#[test]
fn generic_add_attaches_each_child_once() {
    let mut fixture = OrderFixture::with_tags(&[1]);

    fixture
        .sync
        .add_children(
            &mut fixture.order,
            &tags_field(),
            &tags(&[2, 3]),
            &[],
            &Context::new(),
        )
        .unwrap();

    assert_eq!(fixture.tag_ids(), vec![1, 2, 3]);
    assert_eq!(fixture.store.stats().attaches, 2);
}

#[test]
fn owned_collection_rejects_generic_add() {
    let mut fixture = OrderFixture::new();
    fixture.store.materialize(fixture.order.id, "notes");

    let err = fixture
        .sync
        .add_children(
            &mut fixture.order,
            &notes_field(),
            &[Record::new(relsync_model::EntityId::from_u128(7))],
            &[],
            &Context::new(),
        )
        .unwrap_err();

    assert_eq!(
        err,
        SyncError::UnsupportedRelationType {
            field: "notes".into(),
            found: RelationKind::OwnedCollection,
            expected: "many-to-many".into(),
        }
    );
    let message = err.to_string();
    assert!(message.contains("owned collection"));
    assert!(message.contains("many-to-many"));
}

#[test]
fn malformed_identifier_removes_nothing() {
    let mut fixture = OrderFixture::with_tags(&[1, 2, 3]);
    let keep = vec![Identifier::of("id", 2i64), Identifier::of("", 3i64)];

    let err = fixture
        .sync
        .reconcile(&mut fixture.order, &tags_field(), &keep, &Context::new())
        .unwrap_err();

    assert!(matches!(err, SyncError::MalformedIdentifier { .. }));
    assert_eq!(fixture.tag_ids(), vec![1, 2, 3]);
    assert_eq!(fixture.store.stats().total(), 0);
}

#[test]
fn aliased_components_are_translated() {
    let mut fixture = OrderFixture::with_tags(&[1, 2, 3]);
    let context = Context::new().with_alias("label", "name");
    let keep = vec![Identifier::of("label", "tag-3")];

    let removed = fixture
        .sync
        .reconcile(&mut fixture.order, &tags_field(), &keep, &context)
        .unwrap();

    assert_eq!(removed, 2);
    assert_eq!(fixture.tag_ids(), vec![3]);
}

#[test]
fn composite_identifier_needs_every_component() {
    let mut fixture = OrderFixture::with_tags(&[1, 2]);
    let keep = vec![
        Identifier::of("id", 1i64).with("name", "tag-1"),
        Identifier::of("id", 2i64).with("name", "other"),
    ];

    let removed = fixture
        .sync
        .reconcile(&mut fixture.order, &tags_field(), &keep, &Context::new())
        .unwrap();

    assert_eq!(removed, 1);
    assert_eq!(fixture.tag_ids(), vec![1]);
}

#[test]
fn unknown_component_keeps_nothing_unless_strict() {
    let keep = vec![Identifier::of("sku", 1i64)];

    let mut lenient = OrderFixture::with_tags(&[1, 2]);
    let removed = lenient
        .sync
        .reconcile(&mut lenient.order, &tags_field(), &keep, &Context::new())
        .unwrap();
    assert_eq!(removed, 2);

    let store = MemoryStore::shared();
    let ty = order_type(&store).build();
    let mut strict = OrderFixture::from_parts(
        store,
        ty,
        EngineConfig::new().with_strict_components(true),
    );
    strict.seed_tags(&[1, 2]);
    let err = strict
        .sync
        .reconcile(&mut strict.order, &tags_field(), &keep, &Context::new())
        .unwrap_err();
    assert!(matches!(err, SyncError::MalformedIdentifier { .. }));
    assert_eq!(strict.tag_ids(), vec![1, 2]);
}

#[test]
fn storage_failure_propagates_unchanged() {
    let mut fixture = OrderFixture::with_tags(&[1, 2]);
    fixture
        .store
        .fail_next_write(StorageError::Unavailable("connection reset".into()));

    let err = fixture.reconcile_tags(&[]).unwrap_err();

    assert_eq!(
        err,
        SyncError::Storage(StorageError::Unavailable("connection reset".into()))
    );
    assert!(err.is_retryable());
}

#[test]
fn native_to_one_relation() {
    let mut fixture = OrderFixture::new();
    let customer_7 = customer(7);

    fixture
        .sync
        .set_child(&mut fixture.order, &customer_field(), &customer_7, &[])
        .unwrap();
    assert_eq!(
        fixture.store.related(fixture.order.id, "customer"),
        Some(customer_7)
    );

    fixture
        .sync
        .clear_child(&mut fixture.order, &customer_field(), &[])
        .unwrap();
    assert_eq!(fixture.store.related(fixture.order.id, "customer"), None);
}

#[test]
fn apply_runs_in_order_and_stops_at_first_failure() {
    let mut fixture = OrderFixture::with_tags(&[1, 2, 3]);
    let operations = vec![
        FieldOperation::SetValue {
            field: status_field(),
            value: Value::from("packed"),
            extra: vec![],
        },
        FieldOperation::Reconcile {
            field: tags_field(),
            keep: keep_ids(&[1]),
        },
        FieldOperation::AddChildren {
            field: notes_field(),
            children: vec![tag(9)],
            extra: vec![],
        },
        FieldOperation::AddChildren {
            field: tags_field(),
            children: tags(&[4]),
            extra: vec![],
        },
    ];
    fixture.store.materialize(fixture.order.id, "notes");

    let err = fixture
        .sync
        .apply(&mut fixture.order, &operations, &Context::new())
        .unwrap_err();

    assert!(matches!(err, SyncError::UnsupportedRelationType { .. }));
    assert_eq!(fixture.order.status, Some(Value::from("packed")));
    assert_eq!(fixture.tag_ids(), vec![1]);
}

#[test]
fn empty_add_does_not_abort_apply() {
    let mut fixture = OrderFixture::with_tags(&[1, 2]);
    let mut unsaved = Order::unsaved();
    let operations = vec![
        FieldOperation::AddChildren {
            field: notes_field(),
            children: vec![],
            extra: vec![],
        },
        FieldOperation::Reconcile {
            field: tags_field(),
            keep: keep_ids(&[2]),
        },
    ];

    let report = fixture
        .sync
        .apply(&mut fixture.order, &operations, &Context::new())
        .unwrap();
    assert_eq!(report.applied, 2);
    assert_eq!(report.removed, 1);
    assert_eq!(fixture.tag_ids(), vec![2]);

    fixture
        .sync
        .add_children(&mut unsaved, &tags_field(), &[], &[], &Context::new())
        .unwrap();
}

#[test]
fn config_loads_from_json() {
    let config: EngineConfig = serde_json::from_str(r#"{"client_side_filter": true}"#).unwrap();
    assert!(config.client_side_filter);
    assert!(!config.strict_components);
}
