use crate::{db::Session, store::MemoryStore, test_support::RecordingStore};
use rowmap_schema::prelude::*;

/// Registry shared by the core tests.
///
/// - `Person`: integer key, nullable name, primitive age, link to `Dog`,
///   self link-list `friends`.
/// - `Dog`: string key, required breed, backlink `owners` from `Person.dog`.
/// - `Note`: no primary key, one text field and a link to `Person`.
/// - `Sample`: one field per scalar kind, string key.
pub(crate) fn schemas() -> SchemaSet {
    SchemaSet::build(vec![
        ModelDecl::new("Person")
            .namespace("test")
            .field(FieldDecl::new("id", FieldKind::Int64).primitive().primary_key())
            .field(FieldDecl::new("name", FieldKind::String))
            .field(FieldDecl::new("age", FieldKind::Int32).primitive())
            .field(FieldDecl::link("dog", "Dog"))
            .field(FieldDecl::link_list("friends", "Person")),
        ModelDecl::new("Dog")
            .namespace("test")
            .field(FieldDecl::new("name", FieldKind::String).primary_key())
            .field(FieldDecl::new("breed", FieldKind::String).required().default_value("mutt"))
            .field(FieldDecl::backlink("owners", "Person", "dog")),
        ModelDecl::new("Note")
            .namespace("test")
            .field(FieldDecl::new("text", FieldKind::String))
            .field(FieldDecl::link("author", "Person")),
        ModelDecl::new("Sample")
            .namespace("test")
            .field(FieldDecl::new("key", FieldKind::String).primary_key().required())
            .field(FieldDecl::new("flag", FieldKind::Bool))
            .field(FieldDecl::new("tiny", FieldKind::Int8))
            .field(FieldDecl::new("small", FieldKind::Int16))
            .field(FieldDecl::new("count", FieldKind::Int32).indexed())
            .field(FieldDecl::new("big", FieldKind::Int64))
            .field(FieldDecl::new("ratio", FieldKind::Float))
            .field(FieldDecl::new("score", FieldKind::Double))
            .field(FieldDecl::new("label", FieldKind::String))
            .field(FieldDecl::new("blob", FieldKind::Binary))
            .field(FieldDecl::new("at", FieldKind::Timestamp)),
    ])
    .expect("fixture schemas should build")
}

/// Memory-store session with every fixture table open and a write
/// transaction active.
pub(crate) fn open_session() -> Session<MemoryStore> {
    let mut store = MemoryStore::new();
    store.begin_write().expect("write transaction should begin");

    let mut session = Session::new(store, schemas());
    session.open_schemas().expect("fixture schemas should open");

    session
}

/// Like [`open_session`], over a store that logs row mutations. The log
/// starts empty.
pub(crate) fn open_recording_session() -> Session<RecordingStore<MemoryStore>> {
    let mut store = MemoryStore::new();
    store.begin_write().expect("write transaction should begin");

    let mut session = Session::new(RecordingStore::new(store), schemas());
    session.open_schemas().expect("fixture schemas should open");
    session.store_mut().take_calls();

    session
}
