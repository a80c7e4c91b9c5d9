use derive_more::Display;
use rowmap_core::error::{ErrorClass, ErrorDetail, ErrorOrigin as CoreErrorOrigin, InternalError};
use rowmap_schema::error::ErrorTree;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Debug, Deserialize, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }
}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        let kind = match &err.detail {
            Some(ErrorDetail::CrossThreadAccess) => ErrorKind::CrossThreadAccess,
            Some(ErrorDetail::DuplicateKey { .. }) => ErrorKind::DuplicateKey,
            Some(ErrorDetail::IllegalNull { .. }) => ErrorKind::IllegalNull,
            Some(ErrorDetail::Json(_)) => ErrorKind::InvalidJson,
            Some(ErrorDetail::Migration(_)) => ErrorKind::MigrationNeeded,
            Some(ErrorDetail::MissingPrimaryKey { .. }) => ErrorKind::MissingPrimaryKey,
            Some(ErrorDetail::NotInTransaction) => ErrorKind::NotInTransaction,
            Some(ErrorDetail::Store(_)) => ErrorKind::Store,
            None => match err.class {
                ErrorClass::NotFound => ErrorKind::NotFound,
                ErrorClass::Unsupported => ErrorKind::Unsupported,
                ErrorClass::Conflict
                | ErrorClass::Corruption
                | ErrorClass::Internal
                | ErrorClass::InvariantViolation => ErrorKind::Internal,
            },
        };

        Self::new(kind, err.origin.into(), err.message)
    }
}

impl From<ErrorTree> for Error {
    fn from(tree: ErrorTree) -> Self {
        Self::new(ErrorKind::SchemaDefinition, ErrorOrigin::Schema, tree.to_string())
    }
}

impl From<rowmap_schema::Error> for Error {
    fn from(err: rowmap_schema::Error) -> Self {
        match err {
            rowmap_schema::Error::Definition(tree) => tree.into(),
        }
    }
}

///
/// ErrorKind
/// Public error taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    /// A model declaration is malformed.
    SchemaDefinition,

    /// Stored tables disagree with the declared schemas.
    MigrationNeeded,

    DuplicateKey,
    IllegalNull,
    CrossThreadAccess,
    NotInTransaction,
    MissingPrimaryKey,
    InvalidJson,
    NotFound,

    /// The request is well-formed but cannot be served, e.g. a row of
    /// another store.
    Unsupported,

    Store,

    /// The caller cannot remediate this.
    Internal,
}

///
/// ErrorOrigin
/// Public origin taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Copy,
    Detach,
    Import,
    Object,
    Schema,
    Session,
    Store,
}

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Copy => Self::Copy,
            CoreErrorOrigin::Detach => Self::Detach,
            CoreErrorOrigin::Import => Self::Import,
            CoreErrorOrigin::Object => Self::Object,
            CoreErrorOrigin::Schema => Self::Schema,
            CoreErrorOrigin::Session => Self::Session,
            CoreErrorOrigin::Store => Self::Store,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowmap_core::store::StoreError;

    #[test]
    fn store_errors_keep_their_origin() {
        let err: Error = InternalError::from(StoreError::NotInWriteTransaction).into();

        assert_eq!(err.kind, ErrorKind::Store);
        assert_eq!(err.origin, ErrorOrigin::Store);
        assert_eq!(err.message, "no write transaction is active");
    }

    #[test]
    fn classes_without_detail_map_by_class() {
        let not_found: Error =
            InternalError::new(ErrorClass::NotFound, CoreErrorOrigin::Session, "gone").into();
        let unsupported: Error =
            InternalError::new(ErrorClass::Unsupported, CoreErrorOrigin::Copy, "no").into();
        let broken: Error =
            InternalError::new(ErrorClass::InvariantViolation, CoreErrorOrigin::Detach, "bad").into();

        assert_eq!(not_found.kind, ErrorKind::NotFound);
        assert_eq!(unsupported.kind, ErrorKind::Unsupported);
        assert_eq!(unsupported.origin, ErrorOrigin::Copy);
        assert_eq!(broken.kind, ErrorKind::Internal);
    }

    #[test]
    fn schema_trees_are_definition_errors() {
        let mut tree = ErrorTree::new();
        tree.add("empty model");

        let err = Error::from(tree);

        assert_eq!(err.kind, ErrorKind::SchemaDefinition);
        assert!(err.message.contains("empty model"));
    }

    #[test]
    fn errors_serialize_with_kind_and_origin() {
        let err = Error::new(ErrorKind::DuplicateKey, ErrorOrigin::Copy, "duplicate");

        let json = serde_json::to_value(&err).expect("error should serialize");

        assert_eq!(
            json,
            serde_json::json!({ "kind": "DuplicateKey", "origin": "Copy", "message": "duplicate" })
        );
    }
}
