//! Storekeep Core Library
//!
//! This crate provides the core functionality for Storekeep, a local
//! inventory of products (name, quantity, price, optional image reference)
//! persisted in a single SQLite table.
//!
//! # Quick Start
//!
//! ```text
//! let store = Arc::new(ProductStore::from_config(&Config::load()?));
//! let lifecycle = Lifecycle::new(store);
//! lifecycle.start().await;
//!
//! let store = lifecycle.store()?;
//! let id = store.create(&NewProduct::new("Widget", 10, 2.50))?;
//! store.update(id, &ProductPatch::new().with_quantity(5))?;
//! let products = store.search("widg")?;
//! ```
//!
//! # Modules
//!
//! - `store`: Product store (CRUD over the `products` table)
//! - `lifecycle`: One-time initialization and readiness broadcast
//! - `models`: Product, create data, and partial-update patch
//! - `storage`: SQLite schema and store errors
//! - `config`: Application configuration

pub mod config;
pub mod lifecycle;
pub mod models;
pub mod storage;
pub mod store;

pub use config::Config;
pub use lifecycle::{InitState, Lifecycle, Readiness};
pub use models::{NewProduct, Product, ProductPatch, WriteOutcome};
pub use storage::{StoreError, StoreResult};
pub use store::{ProductStore, StoreLocation};
