//! Storage layer
//!
//! SQLite schema and the error types shared by the product store.

pub mod error;
pub mod schema;

pub use error::{StoreError, StoreResult};
pub use schema::init_schema;
