#![forbid(unsafe_code)]

mod error;
mod events;
mod production;
mod products;
mod refs;
mod sales;
mod stock;
mod support;
mod types;

pub use error::StoreError;
pub use types::*;

use rusqlite::{Connection, ErrorCode, OptionalExtension, Transaction, params};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DB_FILE_NAME: &str = "inventory.db";
const SCHEMA_VERSION: i64 = 1;

/// Relational half of the inventory: product registry, quantity ledgers,
/// sales and event targets, all in one SQLite file.
///
/// Each public operation runs in its own transaction. Nothing here touches the
/// product directory tree; see [`crate::Inventory`] for the coordinated
/// operations.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    storage_dir: PathBuf,
}

impl SqliteStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let db_path = storage_dir.join(DB_FILE_NAME);
        let conn = Connection::open(db_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys = ON;")?;

        preflight_gate(&conn)?;
        install_schema(&conn)?;

        Ok(Self { conn, storage_dir })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Clears the quantity ledgers. With `include_sales`, sales, event
    /// targets and events go too. Products are never touched.
    pub fn reset_ledgers(&mut self, include_sales: bool) -> Result<LedgerCounts, StoreError> {
        let tx = self.conn.transaction()?;
        let counts = ledger_counts_tx(&tx)?;
        tx.execute("DELETE FROM stock", [])?;
        tx.execute("DELETE FROM production_queue", [])?;
        if include_sales {
            tx.execute("DELETE FROM sales", [])?;
            tx.execute("DELETE FROM event_targets", [])?;
            tx.execute("DELETE FROM events", [])?;
        }
        tx.commit()?;
        tracing::info!(
            stock = counts.stock,
            production = counts.production,
            sales = counts.sales,
            include_sales,
            "ledgers reset"
        );
        Ok(counts)
    }

    pub fn ledger_counts(&mut self) -> Result<LedgerCounts, StoreError> {
        let tx = self.conn.transaction()?;
        let counts = ledger_counts_tx(&tx)?;
        tx.commit()?;
        Ok(counts)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct LedgerCounts {
    pub stock: usize,
    pub production: usize,
    pub sales: usize,
    pub targets: usize,
}

fn ledger_counts_tx(tx: &Transaction<'_>) -> Result<LedgerCounts, StoreError> {
    let count = |table: &str| -> Result<usize, StoreError> {
        let value = tx.query_row(&format!("SELECT COUNT(1) FROM {table}"), [], |row| {
            row.get::<_, i64>(0)
        })?;
        Ok(to_usize(value))
    };
    Ok(LedgerCounts {
        stock: count("stock")?,
        production: count("production_queue")?,
        sales: count("sales")?,
        targets: count("event_targets")?,
    })
}

fn preflight_gate(conn: &Connection) -> Result<(), StoreError> {
    let has_meta = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='store_meta'",
            [],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .is_some();
    if !has_meta {
        let tables = conn.query_row(
            "SELECT COUNT(1) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
            [],
            |row| row.get::<_, i64>(0),
        )?;
        if tables > 0 {
            return Err(StoreError::InvalidArgument(
                "RESET_REQUIRED: unknown tables without schema metadata",
            ));
        }
        return Ok(());
    }

    let version = conn
        .query_row(
            "SELECT value FROM store_meta WHERE key='schema_version'",
            [],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    match version.as_deref().map(str::parse::<i64>) {
        Some(Ok(v)) if v == SCHEMA_VERSION => Ok(()),
        Some(_) => Err(StoreError::InvalidArgument(
            "RESET_REQUIRED: schema version mismatch",
        )),
        None => Err(StoreError::InvalidArgument(
            "RESET_REQUIRED: schema version row is missing",
        )),
    }
}

fn install_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS store_meta (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS products (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          category TEXT NOT NULL,
          product_folder TEXT NOT NULL,
          sku TEXT NOT NULL DEFAULT '',
          ukca TEXT NOT NULL DEFAULT 'No',
          listings TEXT NOT NULL DEFAULT '',
          tags TEXT NOT NULL DEFAULT '',
          facebook_url TEXT NOT NULL DEFAULT '',
          tiktok_url TEXT NOT NULL DEFAULT '',
          ebay_url TEXT NOT NULL DEFAULT '',
          etsy_url TEXT NOT NULL DEFAULT '',
          status TEXT NOT NULL CHECK(status IN ('Draft', 'Live', 'Archived')),
          colors TEXT NOT NULL DEFAULT '',
          sizes TEXT NOT NULL DEFAULT '',
          cost_to_make TEXT NOT NULL DEFAULT '',
          sale_price TEXT NOT NULL DEFAULT '',
          postage_price TEXT NOT NULL DEFAULT '',
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL,
          UNIQUE(category, product_folder)
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_products_sku
          ON products(sku) WHERE sku <> '';

        CREATE TABLE IF NOT EXISTS stock (
          category TEXT NOT NULL,
          product_folder TEXT NOT NULL,
          sku TEXT NOT NULL DEFAULT '',
          color TEXT NOT NULL,
          size TEXT NOT NULL,
          quantity INTEGER NOT NULL CHECK(quantity > 0),
          updated_at_ms INTEGER NOT NULL,
          PRIMARY KEY(category, product_folder, color, size)
        );

        CREATE TABLE IF NOT EXISTS production_queue (
          category TEXT NOT NULL,
          product_folder TEXT NOT NULL,
          color TEXT NOT NULL,
          size TEXT NOT NULL,
          status TEXT NOT NULL CHECK(status IN ('Queued', 'Printing')),
          quantity INTEGER NOT NULL CHECK(quantity > 0),
          updated_at_ms INTEGER NOT NULL,
          PRIMARY KEY(category, product_folder, color, size, status)
        );

        CREATE TABLE IF NOT EXISTS events (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          name TEXT NOT NULL,
          event_date TEXT,
          created_at_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS event_targets (
          event_id INTEGER NOT NULL,
          category TEXT NOT NULL,
          product_folder TEXT NOT NULL,
          color TEXT NOT NULL,
          size TEXT NOT NULL,
          quantity INTEGER NOT NULL CHECK(quantity > 0),
          PRIMARY KEY(event_id, category, product_folder, color, size),
          FOREIGN KEY(event_id) REFERENCES events(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS sales (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          event_id INTEGER NOT NULL,
          product_id INTEGER,
          category TEXT NOT NULL,
          product_folder TEXT NOT NULL,
          sku TEXT NOT NULL,
          color TEXT NOT NULL,
          size TEXT NOT NULL,
          quantity INTEGER NOT NULL CHECK(quantity > 0),
          unit_price TEXT NOT NULL,
          override_price TEXT,
          payment_method TEXT NOT NULL,
          created_at_ms INTEGER NOT NULL,
          FOREIGN KEY(event_id) REFERENCES events(id) ON DELETE RESTRICT,
          FOREIGN KEY(product_id) REFERENCES products(id) ON DELETE SET NULL
        );

        CREATE INDEX IF NOT EXISTS idx_sales_event ON sales(event_id, id);
        "#,
    )?;

    conn.execute(
        "INSERT INTO store_meta(key, value) VALUES ('schema_version', ?1) \
         ON CONFLICT(key) DO NOTHING",
        params![SCHEMA_VERSION.to_string()],
    )?;
    Ok(())
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, message) => {
            code.code == ErrorCode::ConstraintViolation
                || message.as_deref().is_some_and(|value| {
                    value.contains("UNIQUE constraint failed")
                        || value.contains("PRIMARY KEY constraint failed")
                })
        }
        _ => false,
    }
}

fn map_unique_conflict(err: rusqlite::Error, message: &'static str) -> StoreError {
    if is_constraint_violation(&err) {
        return StoreError::Conflict(message);
    }
    StoreError::Sql(err)
}

const QUANTITY_OVERFLOW: &str = "quantity overflow";

fn checked_quantity(current: i64, delta: i64) -> Result<i64, StoreError> {
    current
        .checked_add(delta)
        .ok_or(StoreError::InvalidArgument(QUANTITY_OVERFLOW))
}

fn to_usize(value: i64) -> usize {
    usize::try_from(value).unwrap_or(0)
}

pub(crate) fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => duration,
        Err(_) => return 0,
    };

    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}
