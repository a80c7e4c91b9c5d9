use crate::node::{BacklinkDescriptor, FieldDescriptor};
use serde::Serialize;

///
/// SchemaDescriptor
///
/// Canonical description of one persistable type. Field order is column
/// order. At most one field is the primary key, and it is always indexed.
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SchemaDescriptor {
    pub name: String,
    pub namespace: String,
    pub fields: Vec<FieldDescriptor>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<usize>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub backlinks: Vec<BacklinkDescriptor>,
}

impl SchemaDescriptor {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    #[must_use]
    pub fn primary_key(&self) -> Option<&FieldDescriptor> {
        self.primary_key.and_then(|i| self.fields.get(i))
    }

    #[must_use]
    pub const fn has_primary_key(&self) -> bool {
        self.primary_key.is_some()
    }

    pub fn indexed_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.indexed)
    }

    /// Link and link-list fields, in column order.
    pub fn links(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.kind.is_relation())
    }

    #[must_use]
    pub fn backlink(&self, name: &str) -> Option<&BacklinkDescriptor> {
        self.backlinks.iter().find(|b| b.name == name)
    }

    /// Table name derived deterministically from the schema name.
    #[must_use]
    pub fn table_name(&self, prefix: &str) -> String {
        table_name(prefix, &self.name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Derive a table name from a schema name.
#[must_use]
pub fn table_name(prefix: &str, schema: &str) -> String {
    format!("{prefix}{schema}")
}
