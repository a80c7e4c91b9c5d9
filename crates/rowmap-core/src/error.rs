use crate::{
    db::{import::JsonError, schema::MigrationError},
    store::StoreError,
};
use std::fmt;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured runtime error with a stable internal classification.
/// The facade crate maps it onto the public error taxonomy.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,

    /// Optional structured error detail.
    pub detail: Option<ErrorDetail>,
}

impl InternalError {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            detail: None,
        }
    }

    fn with_detail(
        class: ErrorClass,
        origin: ErrorOrigin,
        message: impl Into<String>,
        detail: ErrorDetail,
    ) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            detail: Some(detail),
        }
    }

    /// Stored layout disagrees with the declared schema.
    pub(crate) fn migration(err: MigrationError) -> Self {
        Self::with_detail(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Schema,
            err.to_string(),
            ErrorDetail::Migration(err),
        )
    }

    /// Insert hit a row that already carries this primary-key value.
    pub(crate) fn duplicate_key(
        origin: ErrorOrigin,
        schema: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let schema = schema.into();
        let value = value.into();

        Self::with_detail(
            ErrorClass::Conflict,
            origin,
            format!("primary key value already exists in '{schema}': {value}"),
            ErrorDetail::DuplicateKey { schema, value },
        )
    }

    pub(crate) fn illegal_null(
        origin: ErrorOrigin,
        schema: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        let schema = schema.into();
        let field = field.into();

        Self::with_detail(
            ErrorClass::InvariantViolation,
            origin,
            format!("field '{schema}.{field}' does not accept null"),
            ErrorDetail::IllegalNull { schema, field },
        )
    }

    pub(crate) fn cross_thread() -> Self {
        Self::with_detail(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Session,
            "store session accessed from a thread other than the one that opened it",
            ErrorDetail::CrossThreadAccess,
        )
    }

    pub(crate) fn not_in_transaction() -> Self {
        Self::with_detail(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Session,
            "mutation attempted outside a write transaction",
            ErrorDetail::NotInTransaction,
        )
    }

    pub(crate) fn missing_primary_key(schema: impl Into<String>, field: impl Into<String>) -> Self {
        let schema = schema.into();
        let field = field.into();

        Self::with_detail(
            ErrorClass::NotFound,
            ErrorOrigin::Import,
            format!("JSON object for '{schema}' does not contain primary key field '{field}'"),
            ErrorDetail::MissingPrimaryKey { schema, field },
        )
    }

    pub(crate) fn json(err: JsonError) -> Self {
        Self::with_detail(
            ErrorClass::Unsupported,
            ErrorOrigin::Import,
            err.to_string(),
            ErrorDetail::Json(err),
        )
    }

    /// Lookup of a schema, field or object that is not registered.
    pub(crate) fn not_found(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::NotFound, origin, message)
    }

    pub(crate) fn unsupported(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, origin, message)
    }

    pub(crate) fn invariant(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvariantViolation, origin, message)
    }

    #[must_use]
    pub const fn is_migration_needed(&self) -> bool {
        matches!(self.detail, Some(ErrorDetail::Migration(_)))
    }

    #[must_use]
    pub const fn is_duplicate_key(&self) -> bool {
        matches!(self.detail, Some(ErrorDetail::DuplicateKey { .. }))
    }

    #[must_use]
    pub const fn is_illegal_null(&self) -> bool {
        matches!(self.detail, Some(ErrorDetail::IllegalNull { .. }))
    }

    #[must_use]
    pub const fn is_cross_thread_access(&self) -> bool {
        matches!(self.detail, Some(ErrorDetail::CrossThreadAccess))
    }

    #[must_use]
    pub const fn is_not_in_transaction(&self) -> bool {
        matches!(self.detail, Some(ErrorDetail::NotInTransaction))
    }

    #[must_use]
    pub const fn is_missing_primary_key(&self) -> bool {
        matches!(self.detail, Some(ErrorDetail::MissingPrimaryKey { .. }))
    }

    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.detail, Some(ErrorDetail::Json(_)))
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.class, ErrorClass::NotFound) && !self.is_missing_primary_key()
    }

    /// Migration report, when this error carries one.
    #[must_use]
    pub const fn migration_error(&self) -> Option<&MigrationError> {
        match &self.detail {
            Some(ErrorDetail::Migration(err)) => Some(err),
            _ => None,
        }
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

impl From<StoreError> for InternalError {
    fn from(err: StoreError) -> Self {
        let class = match &err {
            StoreError::DuplicatePrimaryKey { .. } => ErrorClass::Conflict,
            StoreError::NoSuchTable { .. }
            | StoreError::NoSuchColumn { .. }
            | StoreError::NoSuchRow { .. } => ErrorClass::NotFound,
            _ => ErrorClass::Internal,
        };

        Self::with_detail(class, ErrorOrigin::Store, err.to_string(), ErrorDetail::Store(err))
    }
}

impl From<JsonError> for InternalError {
    fn from(err: JsonError) -> Self {
        Self::json(err)
    }
}

///
/// ErrorDetail
///
/// Structured detail carried by [`InternalError`]; one variant per failure
/// callers are expected to match on.
///

#[derive(Debug, ThisError)]
#[remain::sorted]
pub enum ErrorDetail {
    #[error("cross-thread access")]
    CrossThreadAccess,

    #[error("duplicate primary key {value} in '{schema}'")]
    DuplicateKey { schema: String, value: String },

    #[error("illegal null for '{schema}.{field}'")]
    IllegalNull { schema: String, field: String },

    #[error("{0}")]
    Json(JsonError),

    #[error("{0}")]
    Migration(MigrationError),

    #[error("missing primary key '{schema}.{field}'")]
    MissingPrimaryKey { schema: String, field: String },

    #[error("not in a write transaction")]
    NotInTransaction,

    #[error("{0}")]
    Store(StoreError),
}

///
/// ErrorClass
/// Internal error taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Conflict,
    Corruption,
    Internal,
    InvariantViolation,
    NotFound,
    Unsupported,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Conflict => "conflict",
            Self::Corruption => "corruption",
            Self::Internal => "internal",
            Self::InvariantViolation => "invariant_violation",
            Self::NotFound => "not_found",
            Self::Unsupported => "unsupported",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Subsystem that raised the error.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Copy,
    Detach,
    Import,
    Object,
    Schema,
    Session,
    Store,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Copy => "copy",
            Self::Detach => "detach",
            Self::Import => "import",
            Self::Object => "object",
            Self::Schema => "schema",
            Self::Session => "session",
            Self::Store => "store",
        };
        write!(f, "{label}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_primary_key_from_store_is_a_conflict() {
        let err = InternalError::from(StoreError::DuplicatePrimaryKey {
            table: "class_Person".into(),
            value: "7".into(),
        });

        assert_eq!(err.class, ErrorClass::Conflict);
        assert_eq!(err.origin, ErrorOrigin::Store);
    }

    #[test]
    fn predicates_follow_detail() {
        let err = InternalError::illegal_null(ErrorOrigin::Copy, "Person", "age");

        assert!(err.is_illegal_null());
        assert!(!err.is_duplicate_key());
        assert_eq!(
            err.display_with_class(),
            "copy:invariant_violation: field 'Person.age' does not accept null"
        );
    }

    #[test]
    fn missing_primary_key_is_not_a_plain_not_found() {
        let err = InternalError::missing_primary_key("Person", "id");

        assert!(err.is_missing_primary_key());
        assert!(!err.is_not_found());
    }
}
