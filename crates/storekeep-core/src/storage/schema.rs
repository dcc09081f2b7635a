//! SQLite schema for the product store
//!
//! Every statement is create-if-not-exists, so running `init_schema` against
//! an existing database never touches stored rows.

use rusqlite::{Connection, Result};

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Products table (timestamps are Unix milliseconds)
        CREATE TABLE IF NOT EXISTS products (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            quantity INTEGER NOT NULL DEFAULT 0,
            price REAL NOT NULL DEFAULT 0.0,
            image_uri TEXT,
            created_at INTEGER NOT NULL
                DEFAULT (CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER)),
            updated_at INTEGER NOT NULL
                DEFAULT (CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER))
        );

        -- Listing order is most recently updated first
        CREATE INDEX IF NOT EXISTS idx_products_updated_at ON products(updated_at);
        "#,
    )?;

    Ok(())
}
