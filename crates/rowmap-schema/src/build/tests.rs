use crate::{
    decl::{FieldDecl, ModelDecl},
    error::ErrorTree,
    node::SchemaSet,
    types::FieldKind,
    value::Value,
};

fn person() -> ModelDecl {
    ModelDecl::new("Person")
        .namespace("app")
        .field(FieldDecl::new("name", FieldKind::String).primary_key())
        .field(FieldDecl::new("age", FieldKind::Int32).primitive())
        .field(FieldDecl::new("nickname", FieldKind::String))
        .field(FieldDecl::link("dog", "Dog"))
        .field(FieldDecl::link_list("friends", "Person"))
}

fn dog() -> ModelDecl {
    ModelDecl::new("Dog")
        .namespace("app")
        .field(FieldDecl::new("name", FieldKind::String).required())
        .field(FieldDecl::backlink("owners", "Person", "dog"))
}

fn build_err(models: Vec<ModelDecl>) -> ErrorTree {
    SchemaSet::build(models).expect_err("declarations should be rejected")
}

fn has_message(tree: &ErrorTree, needle: &str) -> bool {
    tree.flatten().iter().any(|line| line.contains(needle))
}

#[test]
fn builds_linked_models() {
    let set = SchemaSet::build(vec![person(), dog()]).expect("models should build");

    assert_eq!(set.len(), 2);
    let person = set.get("Person").expect("Person should be registered");
    assert_eq!(person.primary_key().map(|f| f.name.as_str()), Some("name"));
    assert!(
        person.field("name").is_some_and(|f| f.indexed),
        "primary key implies indexed"
    );

    let dog = set.get("Dog").expect("Dog should be registered");
    assert_eq!(dog.len(), 1, "backlinks are not columns");
    assert_eq!(
        dog.backlink("owners").map(|b| b.source_field.as_str()),
        Some("dog")
    );
}

#[test]
fn nullability_follows_representation_and_kind() {
    let set = SchemaSet::build(vec![person(), dog()]).expect("models should build");
    let person = set.get("Person").expect("Person should be registered");

    let nullable = |name: &str| person.field(name).map(|f| f.nullable);
    assert_eq!(nullable("age"), Some(false), "primitive scalar");
    assert_eq!(nullable("nickname"), Some(true), "boxed scalar");
    assert_eq!(nullable("dog"), Some(true), "link");
    assert_eq!(nullable("friends"), Some(false), "link-list");

    let dog = set.get("Dog").expect("Dog should be registered");
    assert_eq!(dog.field("name").map(|f| f.nullable), Some(false), "required boxed");
}

#[test]
fn ignored_fields_are_not_persisted() {
    let model = ModelDecl::new("Note")
        .field(FieldDecl::new("body", FieldKind::String))
        .field(FieldDecl::new("scratch", FieldKind::Binary).ignored());
    let set = SchemaSet::build(vec![model]).expect("model should build");

    assert!(set.get("Note").is_some_and(|s| s.field("scratch").is_none()));
}

#[test]
fn abstract_models_have_no_descriptor_and_cannot_be_linked() {
    let base = ModelDecl::new("Base")
        .abstract_model()
        .field(FieldDecl::new("id", FieldKind::Int64));
    let holder = ModelDecl::new("Holder").field(FieldDecl::link("base", "Base"));

    let errs = build_err(vec![base.clone(), holder]);
    assert!(has_message(&errs, "only concrete schemas can be linked"));

    let set = SchemaSet::build(vec![base, dog_free()]).expect("abstract model alone is fine");
    assert!(!set.contains("Base"));
}

fn dog_free() -> ModelDecl {
    ModelDecl::new("Cat").field(FieldDecl::new("name", FieldKind::String))
}

#[test]
fn more_than_one_primary_key_is_rejected() {
    let model = ModelDecl::new("Pair")
        .field(FieldDecl::new("a", FieldKind::Int64).primary_key())
        .field(FieldDecl::new("b", FieldKind::String).primary_key());

    let errs = build_err(vec![model]);
    assert!(has_message(&errs, "more than one primary key"));
}

#[test]
fn primary_key_kind_is_restricted() {
    let model = ModelDecl::new("Reading")
        .field(FieldDecl::new("value", FieldKind::Double).primary_key());

    let errs = build_err(vec![model]);
    let field = errs
        .child("Reading")
        .and_then(|m| m.child("value"))
        .expect("error should be routed to the field");
    assert!(field.messages()[0].contains("cannot be a primary key"));
}

#[test]
fn non_indexable_kinds_are_rejected() {
    let model = ModelDecl::new("Blob").field(FieldDecl::new("data", FieldKind::Binary).indexed());

    assert!(has_message(&build_err(vec![model]), "cannot be indexed"));
}

#[test]
fn required_on_primitive_is_unnecessary() {
    let model = ModelDecl::new("Counter")
        .field(FieldDecl::new("n", FieldKind::Int64).primitive().required());

    assert!(has_message(&build_err(vec![model]), "required is unnecessary"));
}

#[test]
fn string_has_no_primitive_representation() {
    let model = ModelDecl::new("Label").field(FieldDecl::new("text", FieldKind::String).primitive());

    assert!(has_message(&build_err(vec![model]), "no primitive representation"));
}

#[test]
fn required_links_are_rejected() {
    let model = ModelDecl::new("Node")
        .field(FieldDecl::new("id", FieldKind::Int64))
        .field(FieldDecl::link("next", "Node").required());

    assert!(has_message(&build_err(vec![model]), "cannot be required"));
}

#[test]
fn unknown_link_target_is_rejected() {
    let model = ModelDecl::new("Owner").field(FieldDecl::link("pet", "Unicorn"));

    assert!(has_message(&build_err(vec![model]), "unknown schema 'Unicorn'"));
}

#[test]
fn backlink_must_point_back() {
    let person = ModelDecl::new("Person")
        .field(FieldDecl::new("name", FieldKind::String))
        .field(FieldDecl::link("dog", "Dog"));
    let cat = ModelDecl::new("Cat")
        .field(FieldDecl::new("name", FieldKind::String))
        .field(FieldDecl::backlink("owners", "Person", "dog"));

    assert!(has_message(
        &build_err(vec![person, dog(), cat]),
        "does not point at 'Cat'"
    ));
}

#[test]
fn backlink_source_must_be_a_link() {
    let person = ModelDecl::new("Person").field(FieldDecl::new("name", FieldKind::String));
    let dog = ModelDecl::new("Dog")
        .field(FieldDecl::new("name", FieldKind::String))
        .field(FieldDecl::backlink("owners", "Person", "name"));

    assert!(has_message(&build_err(vec![person, dog]), "not a link"));
}

#[test]
fn models_without_persistable_fields_are_rejected() {
    let empty = ModelDecl::new("Empty").field(FieldDecl::new("cache", FieldKind::String).ignored());

    assert!(has_message(
        &build_err(vec![empty]),
        "must contain at least 1 persistable field"
    ));
}

#[test]
fn defaults_must_fit_the_kind() {
    let model = ModelDecl::new("Limits")
        .field(FieldDecl::new("small", FieldKind::Int8).default_value(300_i64))
        .field(FieldDecl::new("flag", FieldKind::Bool).default_value(true));

    let errs = build_err(vec![model]);
    assert_eq!(errs.len(), 1);
    assert!(has_message(&errs, "Limits.small"));
}

#[test]
fn null_default_needs_a_nullable_field() {
    let model = ModelDecl::new("Strict")
        .field(FieldDecl::new("tag", FieldKind::String).required().default_value(Value::Null));

    assert!(has_message(&build_err(vec![model]), "default cannot be null"));
}

#[test]
fn duplicate_schema_names_are_rejected() {
    let a = ModelDecl::new("Item")
        .namespace("shop")
        .field(FieldDecl::new("id", FieldKind::Int64));
    let b = ModelDecl::new("Item")
        .namespace("game")
        .field(FieldDecl::new("id", FieldKind::Int64));

    assert!(has_message(&build_err(vec![a, b]), "declared in both 'shop' and 'game'"));
}

#[test]
fn overlong_names_are_rejected() {
    let model = ModelDecl::new("X".repeat(crate::MAX_SCHEMA_NAME_LEN + 1))
        .field(FieldDecl::new("f".repeat(crate::MAX_FIELD_NAME_LEN + 1), FieldKind::Bool));

    let errs = build_err(vec![model]);
    assert_eq!(errs.len(), 2, "schema and field name are both reported");
}

#[test]
fn every_failing_model_is_reported() {
    let a = ModelDecl::new("A").field(FieldDecl::new("x", FieldKind::Binary).primary_key());
    let b = ModelDecl::new("B");

    let errs = build_err(vec![a, b]);
    assert!(errs.child("A").is_some());
    assert!(errs.child("B").is_some());
}

#[test]
fn descriptors_serialize_for_inspection() {
    let set = SchemaSet::build(vec![person(), dog()]).expect("models should build");
    let json = serde_json::to_value(set.get("Dog").expect("Dog should be registered").as_ref())
        .expect("descriptor should serialize");

    assert_eq!(json["backlinks"][0]["source_schema"], "Person");
}
