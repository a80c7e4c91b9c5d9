//! Store session and the mapping engines that run against it.

mod cache;
mod copy;
mod detach;
pub mod import;
mod read;
pub mod schema;
mod session;


pub use copy::CopyPolicy;
pub use schema::ColumnLayout;
pub use session::Session;
