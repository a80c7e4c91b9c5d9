use derive_more::Display;
use serde::{Deserialize, Serialize};

///
/// FieldKind
///
/// Closed set of declared value kinds. Every mapping decision (stored column
/// type, index and primary-key eligibility, integer range) is resolved through
/// [`FieldKind::mapping`] rather than by type name.
///

#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[remain::sorted]
pub enum FieldKind {
    Backlink,
    Binary,
    Bool,
    Double,
    Float,
    Int8,
    Int16,
    Int32,
    Int64,
    Link,
    LinkList,
    String,
    Timestamp,
}

impl FieldKind {
    pub const ALL: [Self; 13] = [
        Self::Backlink,
        Self::Binary,
        Self::Bool,
        Self::Double,
        Self::Float,
        Self::Int8,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::Link,
        Self::LinkList,
        Self::String,
        Self::Timestamp,
    ];

    /// Resolve the static mapping row for this kind.
    #[must_use]
    pub const fn mapping(self) -> &'static KindMapping {
        &KIND_MAPPINGS[self as usize]
    }

    #[must_use]
    pub const fn is_link(self) -> bool {
        matches!(self, Self::Link)
    }

    #[must_use]
    pub const fn is_link_list(self) -> bool {
        matches!(self, Self::LinkList)
    }

    #[must_use]
    pub const fn is_backlink(self) -> bool {
        matches!(self, Self::Backlink)
    }

    /// True for kinds that reference another schema (link, link-list, backlink).
    #[must_use]
    pub const fn is_relation(self) -> bool {
        matches!(self, Self::Link | Self::LinkList | Self::Backlink)
    }

    /// True for kinds stored as a plain value column.
    #[must_use]
    pub const fn is_scalar(self) -> bool {
        !self.is_relation()
    }

    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }
}

///
/// Repr
///
/// In-memory representation of a declared scalar. `Primitive` values can
/// never hold null; `Boxed` values can unless marked required.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum Repr {
    Primitive,
    #[default]
    Boxed,
}

///
/// ColumnType
/// Stored column type as the row store reports it.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
#[remain::sorted]
pub enum ColumnType {
    #[display("binary")]
    Binary,
    #[display("bool")]
    Bool,
    #[display("date")]
    Date,
    #[display("double")]
    Double,
    #[display("float")]
    Float,
    #[display("int")]
    Int,
    #[display("link")]
    Link,
    #[display("link_list")]
    LinkList,
    #[display("string")]
    String,
}

impl ColumnType {
    #[must_use]
    pub const fn is_link(self) -> bool {
        matches!(self, Self::Link | Self::LinkList)
    }
}

///
/// KindMapping
/// One immutable row of the declared-kind lookup table.
///

#[derive(Debug)]
pub struct KindMapping {
    pub kind: FieldKind,
    /// Column type used in the store; `None` for computed kinds.
    pub column: Option<ColumnType>,
    pub indexable: bool,
    pub primary_key: bool,
    /// Kind may be declared with a primitive (non-nullable) representation.
    pub primitive: bool,
    /// Inclusive integer range for integer kinds.
    pub range: Option<(i64, i64)>,
}

const fn row(
    kind: FieldKind,
    column: Option<ColumnType>,
    indexable: bool,
    primary_key: bool,
    primitive: bool,
    range: Option<(i64, i64)>,
) -> KindMapping {
    KindMapping {
        kind,
        column,
        indexable,
        primary_key,
        primitive,
        range,
    }
}

// Indexed by `FieldKind as usize`; order must follow the enum declaration.
static KIND_MAPPINGS: [KindMapping; 13] = [
    row(FieldKind::Backlink, None, false, false, false, None),
    row(FieldKind::Binary, Some(ColumnType::Binary), false, false, false, None),
    row(FieldKind::Bool, Some(ColumnType::Bool), true, false, true, None),
    row(FieldKind::Double, Some(ColumnType::Double), false, false, true, None),
    row(FieldKind::Float, Some(ColumnType::Float), false, false, true, None),
    row(
        FieldKind::Int8,
        Some(ColumnType::Int),
        true,
        true,
        true,
        Some((i8::MIN as i64, i8::MAX as i64)),
    ),
    row(
        FieldKind::Int16,
        Some(ColumnType::Int),
        true,
        true,
        true,
        Some((i16::MIN as i64, i16::MAX as i64)),
    ),
    row(
        FieldKind::Int32,
        Some(ColumnType::Int),
        true,
        true,
        true,
        Some((i32::MIN as i64, i32::MAX as i64)),
    ),
    row(
        FieldKind::Int64,
        Some(ColumnType::Int),
        true,
        true,
        true,
        Some((i64::MIN, i64::MAX)),
    ),
    row(FieldKind::Link, Some(ColumnType::Link), false, false, false, None),
    row(FieldKind::LinkList, Some(ColumnType::LinkList), false, false, false, None),
    row(FieldKind::String, Some(ColumnType::String), true, true, false, None),
    row(FieldKind::Timestamp, Some(ColumnType::Date), true, false, false, None),
];
