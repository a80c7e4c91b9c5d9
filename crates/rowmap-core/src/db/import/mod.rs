//! JSON import.
//!
//! Two front ends over one set of field rules: object mode walks a parsed
//! `serde_json::Value`, streaming mode drives a `serde` deserializer and
//! defers row resolution until the primary key has been read.

mod coerce;
mod error;
mod object;
mod stream;


pub use error::JsonError;
