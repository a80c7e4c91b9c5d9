//! End-to-end scenarios through the public session API.

mod common;

use common::{descriptor, open_session, schemas};
use rowmap_core::{
    config::Config,
    obs::{MetricsEvent, MetricsSink},
    prelude::*,
};
use serde_json::json;
use std::sync::{Arc, Mutex};

///
/// CreatedRows
/// Sink that remembers the schema of every created row.
///

#[derive(Default)]
struct CreatedRows(Mutex<Vec<String>>);

impl MetricsSink for CreatedRows {
    fn record(&self, event: MetricsEvent<'_>) {
        if let MetricsEvent::RowCreated { schema } = event
            && let Ok(mut rows) = self.0.lock()
        {
            rows.push(schema.to_string());
        }
    }
}

#[test]
fn cancelled_transaction_discards_copied_rows() {
    let mut session = open_session();
    session.store_mut().commit().expect("schema transaction should commit");
    session.store_mut().begin_write().expect("write transaction should begin");

    let mut graph = ObjectGraph::new();
    let ann = graph.create(&descriptor(&session, "Person"));
    graph.set_value(ann, "id", 1_i64).expect("id should set");

    session.copy_to_store(&graph, ann).expect("copy should succeed");
    assert_eq!(session.row_count("Person").ok(), Some(1));

    session.store_mut().cancel().expect("cancel should succeed");
    assert_eq!(session.row_count("Person").ok(), Some(0));

    let err = session
        .copy_to_store(&graph, ann)
        .expect_err("copy outside a transaction should fail");
    assert!(err.is_not_in_transaction());
}

#[test]
fn session_sink_sees_every_created_row() {
    let sink = Arc::new(CreatedRows::default());
    let mut session = open_session().metrics_sink(sink.clone());

    session
        .import_json_object(
            "Person",
            &json!({ "id": 1, "dog": { "name": "Rex" }, "friends": [{ "id": 2 }] }),
            false,
        )
        .expect("import should succeed");

    let mut created = sink.0.lock().map(|rows| rows.clone()).unwrap_or_default();
    created.sort();
    assert_eq!(created, vec!["Dog", "Person", "Person"]);
}

#[test]
fn table_prefix_comes_from_configuration() {
    let config = Config::from_json_str(r#"{"table_prefix": "t_"}"#).expect("config should parse");
    let mut store = MemoryStore::new();
    store.begin_write().expect("write transaction should begin");

    let mut session = Session::new(store, schemas()).with_config(config);
    session.open_schemas().expect("schemas should open");

    assert!(session.store().has_table("t_Person"));
    assert!(session.store().has_table("t_Dog"));
    assert!(!session.store().has_table("class_Person"));
}

#[test]
fn reopening_with_a_changed_model_needs_migration() {
    let store = open_session().into_store();
    let changed = SchemaSet::build(vec![
        ModelDecl::new("Person")
            .field(FieldDecl::new("id", FieldKind::Int64).primitive().primary_key())
            .field(FieldDecl::new("name", FieldKind::String))
            .field(FieldDecl::link("dog", "Dog"))
            .field(FieldDecl::link_list("friends", "Person")),
        ModelDecl::new("Dog")
            .field(FieldDecl::new("name", FieldKind::String).primary_key().required())
            .field(FieldDecl::new("breed", FieldKind::String)),
    ])
    .expect("changed schemas should build");

    let mut session = Session::new(store, changed);
    let err = session
        .open_schemas()
        .expect_err("dropped field should need a migration");

    assert!(err.is_migration_needed());
    let report = err.migration_error().and_then(|m| m.report("Person"));
    assert!(report.is_some_and(|r| !r.mismatches.is_empty()));
    assert!(
        err.migration_error().and_then(|m| m.report("Dog")).is_none(),
        "an unchanged model is not reported"
    );
}

#[test]
fn json_and_streamed_documents_meet_in_one_table() {
    let mut session = open_session();

    session
        .import_json_object("Person", &json!({ "id": 7, "name": "A", "age": 1 }), true)
        .expect("object import should succeed");
    let row = session
        .import_json_stream("Person", r#"{"age":2,"id":7}"#.as_bytes(), true)
        .expect("stream import should update");

    assert_eq!(session.row_count("Person").ok(), Some(1));
    assert_eq!(session.get_value(row, "name").ok(), Some(Value::from("A")));
    assert_eq!(session.get_value(row, "age").ok(), Some(Value::Int(2)));
}

#[test]
fn detached_copy_can_be_edited_and_copied_back() {
    let mut session = open_session();
    let row = session
        .import_json_object(
            "Person",
            &json!({ "id": 1, "name": "Ann", "dog": { "name": "Rex", "breed": "lab" } }),
            false,
        )
        .expect("import should succeed");

    let mut graph = ObjectGraph::new();
    let ann = session
        .create_detached_copy(row, 1, &mut graph)
        .expect("detach should succeed");
    graph.set_value(ann, "name", "Anne").expect("name should set");

    let again = session
        .copy_or_update(&graph, ann)
        .expect("edited copy should update");

    assert_eq!(again, row);
    assert_eq!(session.get_value(row, "name").ok(), Some(Value::from("Anne")));
    assert_eq!(session.row_count("Dog").ok(), Some(1));
    let dog = session
        .get_link(row, "dog")
        .expect("link should read")
        .expect("dog should stay linked");
    assert_eq!(session.linking_rows(dog, "owners").ok(), Some(vec![row]));
}
