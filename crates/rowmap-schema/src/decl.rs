//! Raw model declarations.
//!
//! These are the finished field lists produced by metadata discovery. They
//! are unchecked; [`crate::node::SchemaSet::build`] turns them into
//! descriptors or reports why it cannot.

use crate::{
    types::{FieldKind, Repr},
    value::Value,
};
use serde::{Deserialize, Serialize};

///
/// FieldDecl
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct FieldDecl {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub repr: Repr,

    /// Link / link-list target schema, or the source schema of a backlink.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Source field of a backlink.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backlink_field: Option<String>,

    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub indexed: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub ignored: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl FieldDecl {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            repr: Repr::Boxed,
            target: None,
            backlink_field: None,
            primary_key: false,
            indexed: false,
            required: false,
            nullable: false,
            ignored: false,
            default: None,
        }
    }

    #[must_use]
    pub fn link(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            target: Some(target.into()),
            ..Self::new(name, FieldKind::Link)
        }
    }

    #[must_use]
    pub fn link_list(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            target: Some(target.into()),
            ..Self::new(name, FieldKind::LinkList)
        }
    }

    /// Computed reverse view of `source_schema.source_field`.
    #[must_use]
    pub fn backlink(
        name: impl Into<String>,
        source_schema: impl Into<String>,
        source_field: impl Into<String>,
    ) -> Self {
        Self {
            target: Some(source_schema.into()),
            backlink_field: Some(source_field.into()),
            ..Self::new(name, FieldKind::Backlink)
        }
    }

    #[must_use]
    pub const fn primitive(mut self) -> Self {
        self.repr = Repr::Primitive;
        self
    }

    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    #[must_use]
    pub const fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    #[must_use]
    pub const fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

///
/// ModelDecl
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ModelDecl {
    pub name: String,
    #[serde(default)]
    pub namespace: String,

    /// Abstract models carry no table and cannot be link targets.
    #[serde(default)]
    pub is_abstract: bool,

    pub fields: Vec<FieldDecl>,
}

impl ModelDecl {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    #[must_use]
    pub const fn abstract_model(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    #[must_use]
    pub fn field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }
}
