//! Unmanaged objects.
//!
//! Objects live in an [`ObjectGraph`] arena and reference each other by
//! [`ObjectId`], so cyclic and diamond-shaped graphs need no shared
//! ownership. An object may also point at an already managed row.

use crate::{
    error::{ErrorOrigin, InternalError},
    store::RowRef,
};
use derive_more::{Display, From};
use rowmap_schema::{node::SchemaDescriptor, types::FieldKind, value::Value};
use std::collections::BTreeMap;

///
/// ObjectId
/// Arena index of an unmanaged object; identity, not structure.
///

#[derive(Clone, Copy, Debug, Display, Eq, From, Hash, Ord, PartialEq, PartialOrd)]
pub struct ObjectId(pub usize);

///
/// ObjectRef
///

#[derive(Clone, Copy, Debug, Eq, From, Hash, PartialEq)]
pub enum ObjectRef {
    Unmanaged(ObjectId),
    Managed(RowRef),
}

impl ObjectRef {
    #[must_use]
    pub const fn as_unmanaged(self) -> Option<ObjectId> {
        match self {
            Self::Unmanaged(id) => Some(id),
            Self::Managed(_) => None,
        }
    }
}

///
/// FieldValue
///
/// One field slot. A `None` link-list is distinct from an empty one: a
/// detached copy cut off by its depth limit leaves lists unset.
///

#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Value(Value),
    Link(Option<ObjectRef>),
    LinkList(Option<Vec<ObjectRef>>),
}

///
/// Object
///

#[derive(Clone, Debug, PartialEq)]
pub struct Object {
    schema: String,
    fields: BTreeMap<String, FieldValue>,
}

impl Object {
    /// New object of `schema` with every field at its initial value.
    #[must_use]
    pub fn new(schema: &SchemaDescriptor) -> Self {
        let fields = schema
            .fields
            .iter()
            .map(|field| {
                let slot = match field.kind {
                    FieldKind::Link => FieldValue::Link(None),
                    FieldKind::LinkList => FieldValue::LinkList(Some(Vec::new())),
                    _ => FieldValue::Value(field.initial_value()),
                };
                (field.name.clone(), slot)
            })
            .collect();

        Self {
            schema: schema.name.clone(),
            fields,
        }
    }

    #[must_use]
    pub fn schema(&self) -> &str {
        &self.schema
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, slot)| (name.as_str(), slot))
    }

    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        match self.fields.get(name) {
            Some(FieldValue::Value(v)) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn link(&self, name: &str) -> Option<ObjectRef> {
        match self.fields.get(name) {
            Some(FieldValue::Link(target)) => *target,
            _ => None,
        }
    }

    #[must_use]
    pub fn link_list(&self, name: &str) -> Option<&[ObjectRef]> {
        match self.fields.get(name) {
            Some(FieldValue::LinkList(Some(items))) => Some(items),
            _ => None,
        }
    }

    pub fn set_value(&mut self, name: &str, value: impl Into<Value>) -> Result<(), InternalError> {
        match self.slot_mut(name)? {
            FieldValue::Value(slot) => {
                *slot = value.into();
                Ok(())
            }
            _ => Err(self.wrong_slot(name, "a scalar")),
        }
    }

    pub fn set_link(&mut self, name: &str, target: Option<ObjectRef>) -> Result<(), InternalError> {
        match self.slot_mut(name)? {
            FieldValue::Link(slot) => {
                *slot = target;
                Ok(())
            }
            _ => Err(self.wrong_slot(name, "a link")),
        }
    }

    pub fn set_link_list(
        &mut self,
        name: &str,
        items: Option<Vec<ObjectRef>>,
    ) -> Result<(), InternalError> {
        match self.slot_mut(name)? {
            FieldValue::LinkList(slot) => {
                *slot = items;
                Ok(())
            }
            _ => Err(self.wrong_slot(name, "a link-list")),
        }
    }

    /// Append to a link-list, creating the list if it is unset.
    pub fn push_link(&mut self, name: &str, target: ObjectRef) -> Result<(), InternalError> {
        match self.slot_mut(name)? {
            FieldValue::LinkList(slot) => {
                slot.get_or_insert_with(Vec::new).push(target);
                Ok(())
            }
            _ => Err(self.wrong_slot(name, "a link-list")),
        }
    }

    // Overwrite a slot without checking its shape; used when rebuilding
    // objects from rows whose layout was already validated.
    pub(crate) fn put(&mut self, name: &str, slot: FieldValue) {
        self.fields.insert(name.to_string(), slot);
    }

    fn slot_mut(&mut self, name: &str) -> Result<&mut FieldValue, InternalError> {
        let schema = &self.schema;
        self.fields.get_mut(name).ok_or_else(|| {
            InternalError::not_found(
                ErrorOrigin::Object,
                format!("schema '{schema}' has no field '{name}'"),
            )
        })
    }

    fn wrong_slot(&self, name: &str, expected: &str) -> InternalError {
        InternalError::unsupported(
            ErrorOrigin::Object,
            format!("field '{}.{name}' is not {expected}", self.schema),
        )
    }
}

///
/// ObjectGraph
///
/// Arena of unmanaged objects. Detached copies are written into one, and
/// copy-in reads from one.
///

#[derive(Clone, Debug, Default)]
pub struct ObjectGraph {
    objects: Vec<Object>,
}

impl ObjectGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, object: Object) -> ObjectId {
        self.objects.push(object);

        ObjectId(self.objects.len() - 1)
    }

    /// Insert a fresh object of `schema` and return its id.
    pub fn create(&mut self, schema: &SchemaDescriptor) -> ObjectId {
        self.insert(Object::new(schema))
    }

    #[must_use]
    pub fn get(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(id.0)
    }

    #[must_use]
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.objects.get_mut(id.0)
    }

    pub(crate) fn object(&self, id: ObjectId) -> Result<&Object, InternalError> {
        self.get(id).ok_or_else(|| missing(id))
    }

    pub(crate) fn object_mut(&mut self, id: ObjectId) -> Result<&mut Object, InternalError> {
        self.get_mut(id).ok_or_else(|| missing(id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &Object)> {
        self.objects
            .iter()
            .enumerate()
            .map(|(i, object)| (ObjectId(i), object))
    }

    // ------------------------------------------------------------------
    // Field shortcuts
    // ------------------------------------------------------------------

    pub fn set_value(
        &mut self,
        id: ObjectId,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<(), InternalError> {
        self.object_mut(id)?.set_value(name, value)
    }

    pub fn link(
        &mut self,
        id: ObjectId,
        name: &str,
        target: impl Into<ObjectRef>,
    ) -> Result<(), InternalError> {
        self.object_mut(id)?.set_link(name, Some(target.into()))
    }

    pub fn unlink(&mut self, id: ObjectId, name: &str) -> Result<(), InternalError> {
        self.object_mut(id)?.set_link(name, None)
    }

    pub fn push(
        &mut self,
        id: ObjectId,
        name: &str,
        target: impl Into<ObjectRef>,
    ) -> Result<(), InternalError> {
        self.object_mut(id)?.push_link(name, target.into())
    }
}

fn missing(id: ObjectId) -> InternalError {
    InternalError::not_found(
        ErrorOrigin::Object,
        format!("object {id} is not part of this graph"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowmap_schema::prelude::*;

    fn person() -> std::sync::Arc<SchemaDescriptor> {
        let set = SchemaSet::build(vec![
            ModelDecl::new("Person")
                .field(FieldDecl::new("age", FieldKind::Int32).primitive())
                .field(FieldDecl::new("name", FieldKind::String).default_value("anon"))
                .field(FieldDecl::link("best", "Person"))
                .field(FieldDecl::link_list("friends", "Person")),
        ])
        .expect("schema should build");

        set.get("Person").cloned().expect("Person should be registered")
    }

    #[test]
    fn new_objects_start_from_initial_values() {
        let object = Object::new(&person());

        assert_eq!(object.value("age"), Some(&Value::Int(0)));
        assert_eq!(object.value("name"), Some(&Value::String("anon".into())));
        assert_eq!(object.link("best"), None);
        assert_eq!(object.link_list("friends"), Some(&[][..]));
    }

    #[test]
    fn slots_keep_their_shape() {
        let mut object = Object::new(&person());

        let err = object
            .set_value("best", 3)
            .expect_err("a link slot should not take a scalar");
        assert_eq!(err.origin, ErrorOrigin::Object);

        let err = object
            .set_value("missing", 3)
            .expect_err("unknown fields should be rejected");
        assert_eq!(err.class, crate::error::ErrorClass::NotFound);
    }

    #[test]
    fn graph_shortcuts_build_cycles() {
        let schema = person();
        let mut graph = ObjectGraph::new();
        let a = graph.create(&schema);
        let b = graph.create(&schema);

        graph.link(a, "best", b).expect("link should be set");
        graph.link(b, "best", a).expect("link should be set");
        graph.push(a, "friends", b).expect("push should succeed");

        let a_obj = graph.get(a).expect("a should exist");
        assert_eq!(a_obj.link("best"), Some(ObjectRef::Unmanaged(b)));
        assert_eq!(a_obj.link_list("friends"), Some(&[ObjectRef::Unmanaged(b)][..]));
        assert!(graph.set_value(ObjectId(9), "age", 1).is_err());
    }
}
