//! Validated schema nodes.
//!
//! Declarations (`decl`) say *what was written*; nodes say *what exists*.
//! Nodes are immutable once built and are shared behind `Arc`.

mod field;
mod schema;
mod set;

pub use field::{BacklinkDescriptor, FieldDescriptor};
pub use schema::{SchemaDescriptor, table_name};
pub use set::SchemaSet;
