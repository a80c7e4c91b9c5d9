//! Declaration checks shared by the builders.
//!
//! Each helper returns a plain message on failure; the caller decides which
//! route of the [`ErrorTree`](crate::error::ErrorTree) it lands under.

pub mod naming;
pub mod relation;
