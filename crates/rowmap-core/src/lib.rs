//! Core runtime for rowmap: the row-store collaborator boundary, table
//! synthesis and validation, and the graph copy engines (copy-in, JSON
//! import, detached copy) that move object graphs into rows and back.
#![warn(unreachable_pub)]

pub mod config;
pub mod db;
pub mod error;
pub mod object;
pub mod obs;
pub mod store;

// test
#[cfg(test)]
pub(crate) mod test_support;

pub use rowmap_schema as schema;

///
/// Prelude
///
/// Domain vocabulary only. Errors, sinks and store internals stay behind
/// their modules.
///

pub mod prelude {
    pub use crate::{
        config::Config,
        db::{CopyPolicy, Session},
        object::{FieldValue, Object, ObjectGraph, ObjectId, ObjectRef},
        store::{MemoryStore, RowKey, RowRef, RowStore, StoreId, TableKey},
    };
    pub use rowmap_schema::prelude::*;
}
