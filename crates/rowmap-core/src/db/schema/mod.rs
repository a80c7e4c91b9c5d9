//! Table synthesis and validation against schema descriptors.

mod layout;
mod mismatch;
mod synthesize;
mod validate;


pub use layout::ColumnLayout;
pub use mismatch::{MigrationError, MigrationReport, NullabilityReason, SchemaMismatch};
