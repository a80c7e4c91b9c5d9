use rowmap_core::prelude::*;
use std::sync::Arc;

/// `Person` links to one `Dog` and to any number of other people.
pub fn schemas() -> SchemaSet {
    SchemaSet::build(vec![
        ModelDecl::new("Person")
            .field(FieldDecl::new("id", FieldKind::Int64).primitive().primary_key())
            .field(FieldDecl::new("name", FieldKind::String))
            .field(FieldDecl::new("age", FieldKind::Int32).primitive())
            .field(FieldDecl::link("dog", "Dog"))
            .field(FieldDecl::link_list("friends", "Person")),
        ModelDecl::new("Dog")
            .field(FieldDecl::new("name", FieldKind::String).primary_key().required())
            .field(FieldDecl::new("breed", FieldKind::String))
            .field(FieldDecl::backlink("owners", "Person", "dog")),
    ])
    .expect("test schemas should build")
}

/// Session over a fresh memory store, tables open, write transaction
/// active.
pub fn open_session() -> Session<MemoryStore> {
    let mut store = MemoryStore::new();
    store.begin_write().expect("write transaction should begin");

    let mut session = Session::new(store, schemas());
    session.open_schemas().expect("test schemas should open");

    session
}

pub fn descriptor(session: &Session<MemoryStore>, schema: &str) -> Arc<SchemaDescriptor> {
    session
        .schemas()
        .get(schema)
        .cloned()
        .expect("schema should be registered")
}
