use crate::types::FieldKind;
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// Timestamp
/// Milliseconds since the Unix epoch.
///

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
pub struct Timestamp(pub i64);

impl Timestamp {
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    #[must_use]
    pub const fn as_millis(self) -> i64 {
        self.0
    }
}

///
/// Value
///
/// Scalar cell value. Every integer kind shares `Int`; the declared kind
/// decides the legal range.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f32),
    Double(f64),
    String(String),
    Binary(Vec<u8>),
    Timestamp(Timestamp),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Zero value written into non-nullable columns when nothing else is known.
    #[must_use]
    pub fn zero(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Bool => Self::Bool(false),
            FieldKind::Int8 | FieldKind::Int16 | FieldKind::Int32 | FieldKind::Int64 => {
                Self::Int(0)
            }
            FieldKind::Float => Self::Float(0.0),
            FieldKind::Double => Self::Double(0.0),
            FieldKind::String => Self::String(String::new()),
            FieldKind::Binary => Self::Binary(Vec::new()),
            FieldKind::Timestamp => Self::Timestamp(Timestamp::default()),
            FieldKind::Link | FieldKind::LinkList | FieldKind::Backlink => Self::Null,
        }
    }

    /// Check whether a non-null value can be stored in a field of `kind`.
    ///
    /// Null is accepted here; nullability is the caller's concern.
    #[must_use]
    pub fn fits(&self, kind: FieldKind) -> bool {
        match (self, kind) {
            (Self::Null, _) => kind.is_scalar(),
            (Self::Bool(_), FieldKind::Bool)
            | (Self::Float(_), FieldKind::Float)
            | (Self::Double(_), FieldKind::Double)
            | (Self::String(_), FieldKind::String)
            | (Self::Binary(_), FieldKind::Binary)
            | (Self::Timestamp(_), FieldKind::Timestamp) => true,
            (Self::Int(v), k) if k.is_integer() => k
                .mapping()
                .range
                .is_some_and(|(min, max)| (min..=max).contains(v)),
            _ => false,
        }
    }

    /// Short label of the value's own type, used in diagnostics.
    #[must_use]
    pub const fn type_label(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::Binary(_) => "binary",
            Self::Timestamp(_) => "timestamp",
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::Binary(v) => write!(f, "<{} bytes>", v.len()),
            Self::Timestamp(v) => write!(f, "@{v}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Self::Int(v.into())
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Self::Int(v.into())
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Binary(v)
    }
}

impl From<Timestamp> for Value {
    fn from(v: Timestamp) -> Self {
        Self::Timestamp(v)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_integer_kinds_enforce_range() {
        assert!(Value::Int(127).fits(FieldKind::Int8));
        assert!(!Value::Int(128).fits(FieldKind::Int8));
        assert!(Value::Int(i64::from(i32::MIN)).fits(FieldKind::Int32));
        assert!(!Value::Int(i64::from(i32::MAX) + 1).fits(FieldKind::Int32));
        assert!(Value::Int(i64::MAX).fits(FieldKind::Int64));
    }

    #[test]
    fn mismatched_kinds_do_not_fit() {
        assert!(!Value::String("1".into()).fits(FieldKind::Int32));
        assert!(!Value::Double(1.0).fits(FieldKind::Float));
        assert!(!Value::Null.fits(FieldKind::Link));
    }

    #[test]
    fn option_none_converts_to_null() {
        let none: Option<i32> = None;
        assert_eq!(Value::from(none), Value::Null);
        assert_eq!(Value::from(Some("a")), Value::String("a".into()));
    }
}
