//! rowmap persists cyclic object graphs into a column-oriented row store
//! and reads them back.
//!
//! ## Crate layout
//! - `core`: row-store boundary, table synthesis and validation, and the
//!   copy-in, JSON import and detached-copy engines.
//! - `schema`: model declarations and the validated schema registry.
//! - `db`: the [`Db`] facade, which reports [`Error`]s.
//! - `error`: the public error taxonomy.

pub use rowmap_core as core;
pub use rowmap_schema as schema;

pub mod db;
pub mod error;

pub use db::Db;
pub use error::{Error, ErrorKind, ErrorOrigin};

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        Db,
        core::{
            config::Config,
            db::CopyPolicy,
            object::{FieldValue, Object, ObjectGraph, ObjectId, ObjectRef},
            store::{MemoryStore, RowRef, RowStore},
        },
        error::{Error, ErrorKind},
    };
    pub use rowmap_schema::prelude::*;
}
