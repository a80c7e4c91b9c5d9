//! Schema descriptors for rowmap.
//!
//! Model declarations (field lists handed over by whatever discovered them)
//! go in, a validated [`node::SchemaSet`] comes out. Every later layer, the
//! table synthesizer, the validator and the copy engines, reads the same
//! descriptors, so the runtime and any offline generator cannot disagree.

mod build;
pub mod decl;
pub mod error;
pub mod node;
pub mod types;
pub mod validate;
pub mod value;

/// Maximum length for schema names.
///
/// Table names are derived as `prefix + name` and the store caps table names
/// at 63 bytes, which leaves 57 bytes after the default `class_` prefix.
pub const MAX_SCHEMA_NAME_LEN: usize = 57;

/// Maximum length for field (column) names.
pub const MAX_FIELD_NAME_LEN: usize = 63;

/// Default prefix prepended to schema names to form table names.
pub const DEFAULT_TABLE_PREFIX: &str = "class_";

use crate::error::ErrorTree;
use thiserror::Error as ThisError;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        decl::{FieldDecl, ModelDecl},
        err,
        error::ErrorTree,
        node::*,
        types::{ColumnType, FieldKind, KindMapping, Repr},
        value::{Timestamp, Value},
    };
    pub use serde::{Deserialize, Serialize};
}

///
/// Error
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("schema definition failed:\n{0}")]
    Definition(ErrorTree),
}

impl From<ErrorTree> for Error {
    fn from(tree: ErrorTree) -> Self {
        Self::Definition(tree)
    }
}
