//! Product store
//!
//! `ProductStore` owns the single SQLite connection and exposes the CRUD
//! operations over the `products` table.
//!
//! ## Usage
//!
//! ```ignore
//! let store = ProductStore::from_config(&config);
//! store.initialize()?;
//!
//! let id = store.create(&NewProduct::new("Widget", 10, 2.50))?;
//! store.update(id, &ProductPatch::new().with_quantity(5))?;
//!
//! let products = store.get_all()?;
//! ```
//!
//! The store is constructed closed. Every operation other than
//! `initialize` returns `StoreError::NotInitialized` until `initialize`
//! has succeeded once.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use crate::config::Config;
use crate::models::{NewProduct, Product, ProductPatch, WriteOutcome};
use crate::storage::{init_schema, StoreError, StoreResult};

const PRODUCT_COLUMNS: &str = "id, name, quantity, price, image_uri, created_at, updated_at";

/// Where the product database lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// A database file on disk
    File(PathBuf),
    /// A private in-memory database (for testing)
    InMemory,
}

impl fmt::Display for StoreLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreLocation::File(path) => write!(f, "{}", path.display()),
            StoreLocation::InMemory => write!(f, ":memory:"),
        }
    }
}

/// Open connection plus the last timestamp handed out
struct StoreHandle {
    conn: Connection,
    last_touch: i64,
}

impl StoreHandle {
    /// Next write timestamp in Unix milliseconds
    ///
    /// Strictly greater than every timestamp issued before, so rows touched
    /// later always sort first.
    fn touch(&mut self) -> i64 {
        let now = Utc::now().timestamp_millis();
        self.last_touch = now.max(self.last_touch + 1);
        self.last_touch
    }
}

/// Durable storage for products
pub struct ProductStore {
    location: StoreLocation,
    handle: Mutex<Option<StoreHandle>>,
}

impl ProductStore {
    /// Create a store for the given location (not yet opened)
    pub fn new(location: StoreLocation) -> Self {
        Self {
            location,
            handle: Mutex::new(None),
        }
    }

    /// Create a file-backed store at `path`
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(StoreLocation::File(path.into()))
    }

    /// Create an in-memory store
    pub fn in_memory() -> Self {
        Self::new(StoreLocation::InMemory)
    }

    /// Create a store at the database path from configuration
    pub fn from_config(config: &Config) -> Self {
        Self::open(config.database_path())
    }

    /// Get the store location
    pub fn location(&self) -> &StoreLocation {
        &self.location
    }

    /// Check whether `initialize` has succeeded
    pub fn is_initialized(&self) -> bool {
        self.lock().is_some()
    }

    /// Open the database and ensure the schema exists
    ///
    /// Creates the data directory and database file if absent. Calling this
    /// again after success does nothing.
    pub fn initialize(&self) -> StoreResult<()> {
        let mut guard = self.lock();
        if guard.is_some() {
            debug!(location = %self.location, "Product store already initialized");
            return Ok(());
        }

        let conn = self.open_connection()?;
        let unavailable = |e: rusqlite::Error| StoreError::unavailable(self.location.to_string(), e);

        init_schema(&conn).map_err(unavailable)?;
        let last_touch: i64 = conn
            .query_row(
                "SELECT COALESCE(MAX(updated_at), 0) FROM products",
                [],
                |row| row.get(0),
            )
            .map_err(unavailable)?;

        info!(location = %self.location, "Product store initialized");
        *guard = Some(StoreHandle { conn, last_touch });
        Ok(())
    }

    /// Insert a new product and return its id
    pub fn create(&self, data: &NewProduct) -> StoreResult<i64> {
        let id = self.with_handle("create product", |handle| {
            let now = handle.touch();
            handle.conn.execute(
                "INSERT INTO products (name, quantity, price, image_uri, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![
                    data.name,
                    data.quantity,
                    data.price,
                    data.stored_image_uri(),
                    now
                ],
            )?;
            Ok(handle.conn.last_insert_rowid())
        })?;

        debug!(id, name = %data.name, "Created product");
        Ok(id)
    }

    /// Get all products, most recently updated first
    pub fn get_all(&self) -> StoreResult<Vec<Product>> {
        self.query_all("list products")
    }

    /// Get a product by id
    pub fn get_by_id(&self, id: i64) -> StoreResult<Option<Product>> {
        self.with_handle("get product", |handle| {
            handle
                .conn
                .query_row(
                    &format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS),
                    params![id],
                    ProductRow::from_row,
                )
                .optional()
        })
        .map(|row| row.map(Product::from))
    }

    /// Apply a partial update
    ///
    /// Only supplied fields are written. An empty patch touches nothing,
    /// including `updated_at`.
    pub fn update(&self, id: i64, patch: &ProductPatch) -> StoreResult<WriteOutcome> {
        let outcome = self.with_handle("update product", |handle| {
            if patch.is_empty() {
                return Ok(WriteOutcome::Skipped);
            }

            let mut assignments = Vec::new();
            let mut values = Vec::new();

            if let Some(ref name) = patch.name {
                assignments.push("name = ?");
                values.push(Value::Text(name.clone()));
            }
            if let Some(quantity) = patch.quantity {
                assignments.push("quantity = ?");
                values.push(Value::Integer(quantity));
            }
            if let Some(price) = patch.price {
                assignments.push("price = ?");
                values.push(Value::Real(price));
            }
            if let Some(ref image_uri) = patch.image_uri {
                assignments.push("image_uri = ?");
                values.push(image_uri.clone().map_or(Value::Null, Value::Text));
            }

            assignments.push("updated_at = ?");
            values.push(Value::Integer(handle.touch()));
            values.push(Value::Integer(id));

            let sql = format!(
                "UPDATE products SET {} WHERE id = ?",
                assignments.join(", ")
            );
            let changed = handle.conn.execute(&sql, params_from_iter(values))?;

            Ok(if changed == 0 {
                WriteOutcome::NoMatchingRow
            } else {
                WriteOutcome::Applied
            })
        })?;

        debug!(id, ?outcome, "Updated product");
        Ok(outcome)
    }

    /// Delete a product
    pub fn delete(&self, id: i64) -> StoreResult<WriteOutcome> {
        let changed = self.with_handle("delete product", |handle| {
            handle
                .conn
                .execute("DELETE FROM products WHERE id = ?1", params![id])
        })?;

        let outcome = if changed == 0 {
            WriteOutcome::NoMatchingRow
        } else {
            WriteOutcome::Applied
        };
        debug!(id, ?outcome, "Deleted product");
        Ok(outcome)
    }

    /// Search products by name, ignoring case
    ///
    /// Same order as `get_all`. The filter runs here rather than through
    /// `LIKE`, which only folds ASCII and treats `%`/`_` as wildcards.
    pub fn search(&self, query: &str) -> StoreResult<Vec<Product>> {
        let products = self.query_all("search products")?;
        Ok(products
            .into_iter()
            .filter(|product| product.name_matches(query))
            .collect())
    }

    /// Get product count
    pub fn count(&self) -> StoreResult<i64> {
        self.with_handle("count products", |handle| {
            handle
                .conn
                .query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))
        })
    }

    fn query_all(&self, operation: &'static str) -> StoreResult<Vec<Product>> {
        self.with_handle(operation, |handle| {
            let mut stmt = handle.conn.prepare(&format!(
                "SELECT {} FROM products ORDER BY updated_at DESC, id DESC",
                PRODUCT_COLUMNS
            ))?;
            let rows = stmt
                .query_map([], ProductRow::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows.into_iter().map(Product::from).collect())
        })
    }

    fn open_connection(&self) -> StoreResult<Connection> {
        match &self.location {
            StoreLocation::InMemory => Connection::open_in_memory()
                .map_err(|e| StoreError::unavailable(self.location.to_string(), e)),
            StoreLocation::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| StoreError::unavailable(self.location.to_string(), e))?;
                }
                Connection::open(path)
                    .map_err(|e| StoreError::unavailable(self.location.to_string(), e))
            }
        }
    }

    fn with_handle<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut StoreHandle) -> rusqlite::Result<T>,
    ) -> StoreResult<T> {
        let mut guard = self.lock();
        let handle = guard
            .as_mut()
            .ok_or(StoreError::NotInitialized { operation })?;
        f(handle).map_err(StoreError::op(operation))
    }

    // Each statement is atomic, so a panic elsewhere cannot leave the
    // connection half-written.
    fn lock(&self) -> MutexGuard<'_, Option<StoreHandle>> {
        self.handle.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Raw row from the products table
struct ProductRow {
    id: i64,
    name: String,
    quantity: i64,
    price: f64,
    image_uri: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            quantity: row.get(2)?,
            price: row.get(3)?,
            image_uri: row.get(4)?,
            created_at: timestamp_column(row, 5)?,
            updated_at: timestamp_column(row, 6)?,
        })
    }
}

/// Read a Unix-millisecond column, rejecting values chrono cannot represent
fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let millis: i64 = row.get(idx)?;
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            format!("timestamp out of range: {}", millis).into(),
        )
    })
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            quantity: row.quantity,
            price: row.price,
            image_uri: row.image_uri,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
