//! SQLite persistence layer.
//!
//! RULE: Only the store modules talk to the database.
//! Engines and services call store methods — they never execute SQL.

use crate::error::DropshipResult;
use rusqlite::Connection;

mod listing;
mod order;
mod product;
mod reference;
mod sync_log;

pub use listing::{ActiveListing, ListingRecord, ListingStatus, NewListing};
pub use order::{DailySummary, NewOrder, OrderRecord, OrderStatus};
pub use product::{NewProduct, ProductRecord, StockStatus};
pub use sync_log::{SyncKind, SyncLogRecord};

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &str) -> DropshipResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> DropshipResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order. Idempotent — every statement
    /// is IF NOT EXISTS.
    pub fn migrate(&self) -> DropshipResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_catalog.sql"))?;
        self.conn
            .execute_batch(include_str!("../../migrations/002_marketplace.sql"))?;
        self.conn
            .execute_batch(include_str!("../../migrations/003_compliance.sql"))?;
        self.conn
            .execute_batch(include_str!("../../migrations/004_sync_log.sql"))?;
        Ok(())
    }

    /// Record counts per table, for the CLI stats command.
    pub fn table_counts(&self) -> DropshipResult<Vec<(String, i64)>> {
        let tables = [
            "products",
            "listings",
            "orders",
            "brand_blacklist",
            "country_restrictions",
            "sync_log",
        ];
        let mut counts = Vec::with_capacity(tables.len());
        for table in tables {
            let count: i64 = self.conn.query_row(
                &format!("SELECT COUNT(*) FROM {table}"),
                [],
                |row| row.get(0),
            )?;
            counts.push((table.to_string(), count));
        }
        Ok(counts)
    }
}
