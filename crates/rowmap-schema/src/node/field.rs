use crate::{
    types::{ColumnType, FieldKind, KindMapping, Repr},
    value::Value,
};
use serde::Serialize;

///
/// FieldDescriptor
/// One persisted column of a schema.
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
    pub repr: Repr,
    pub nullable: bool,
    pub indexed: bool,
    pub primary_key: bool,

    /// Target schema for link and link-list fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl FieldDescriptor {
    #[must_use]
    pub const fn mapping(&self) -> &'static KindMapping {
        self.kind.mapping()
    }

    /// Stored column type. Backlinks never become descriptors, so this is
    /// always present for a built field.
    #[must_use]
    pub const fn column_type(&self) -> Option<ColumnType> {
        self.mapping().column
    }

    #[must_use]
    pub const fn is_link(&self) -> bool {
        self.kind.is_link()
    }

    #[must_use]
    pub const fn is_link_list(&self) -> bool {
        self.kind.is_link_list()
    }

    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        self.kind.is_scalar()
    }

    #[must_use]
    pub const fn is_primitive(&self) -> bool {
        matches!(self.repr, Repr::Primitive)
    }

    /// Value an unmanaged object starts with for this field.
    ///
    /// Boxed fields start unset even when required, so copying an object
    /// whose required field was never assigned is an illegal null.
    #[must_use]
    pub fn initial_value(&self) -> Value {
        match &self.default {
            Some(default) => default.clone(),
            None if self.is_primitive() => Value::zero(self.kind),
            None => Value::Null,
        }
    }

    /// Value written into a freshly created row when nothing else is given.
    #[must_use]
    pub fn seed_value(&self) -> Value {
        match &self.default {
            Some(default) => default.clone(),
            None if self.nullable => Value::Null,
            None => Value::zero(self.kind),
        }
    }
}

///
/// BacklinkDescriptor
/// Computed, read-only reverse view of a link or link-list.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct BacklinkDescriptor {
    pub name: String,
    pub source_schema: String,
    pub source_field: String,
}
