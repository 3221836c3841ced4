//! Alert documents
//!
//! The store treats alerts as opaque JSON documents apart from the three
//! fields it fills in at write time.

pub mod model;

pub use model::{Alert, DEFAULT_STATUS};
