//! redb-based storage layer for the workflow core
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `sequences` | `"{prefix}{YYMMDD}"` | `u64` | Daily identifier counters |
//! | `orders` | order number | `WorkflowRecord` | Order records + audit trail |
//! | `applications` | application number | `WorkflowRecord` | Application records + audit trail |
//! | `stock` | catalog item ID | `u64` | Available quantity |
//! | `verification_codes` | `"{identifier}#{purpose}"` | `VerificationCode` | Live one-time codes |
//!
//! # Concurrency
//!
//! redb admits a single write transaction at a time, so every mutation in
//! this core (counter increment, stock reservation, workflow transition,
//! code verification) runs as one serialized read-validate-write unit.
//! Commits are durable as soon as `commit()` returns.

use redb::{
    Database, ReadTransaction, ReadableDatabase, TableDefinition, WriteTransaction,
};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Daily identifier counters: key = "{prefix}{YYMMDD}", value = last allocated sequence
pub const SEQUENCES_TABLE: TableDefinition<&str, u64> = TableDefinition::new("sequences");

/// Order records: key = order number, value = JSON-serialized WorkflowRecord
pub const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Application records: key = application number, value = JSON-serialized WorkflowRecord
pub const APPLICATIONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("applications");

/// Stock ledger: key = catalog item ID, value = available quantity
pub const STOCK_TABLE: TableDefinition<&str, u64> = TableDefinition::new("stock");

/// Verification codes: key = "{identifier}#{purpose}", value = JSON-serialized VerificationCode
pub const CODES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("verification_codes");

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Shared storage handle for the workflow core
///
/// Cheap to clone; all components (minter, ledger, workflow engines,
/// verification service) share the same underlying database so that a
/// single write transaction can span related tables.
#[derive(Clone)]
pub struct CoreStorage {
    db: Arc<Database>,
}

impl CoreStorage {
    /// Open or create the database at the given path
    ///
    /// All tables are created up front so read transactions never hit a
    /// missing-table error.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    /// Open an in-memory database (tests and demos)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    fn init_tables(&self) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(SEQUENCES_TABLE)?;
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(APPLICATIONS_TABLE)?;
            let _ = write_txn.open_table(STOCK_TABLE)?;
            let _ = write_txn.open_table(CODES_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    /// Begin a read transaction
    pub fn begin_read(&self) -> StorageResult<ReadTransaction> {
        Ok(self.db.begin_read()?)
    }
}

impl std::fmt::Debug for CoreStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreStorage").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redb::ReadableTable;

    #[test]
    fn test_open_in_memory_creates_tables() {
        let storage = CoreStorage::open_in_memory().unwrap();

        // Read transactions must not fail on freshly created tables
        let read_txn = storage.begin_read().unwrap();
        let table = read_txn.open_table(SEQUENCES_TABLE).unwrap();
        assert!(table.get("ORD250114").unwrap().is_none());
        let table = read_txn.open_table(ORDERS_TABLE).unwrap();
        assert!(table.get("ORD2501140001").unwrap().is_none());
    }

    #[test]
    fn test_write_then_read() {
        let storage = CoreStorage::open_in_memory().unwrap();

        let txn = storage.begin_write().unwrap();
        {
            let mut table = txn.open_table(STOCK_TABLE).unwrap();
            table.insert("item-1", 25u64).unwrap();
        }
        txn.commit().unwrap();

        let read_txn = storage.begin_read().unwrap();
        let table = read_txn.open_table(STOCK_TABLE).unwrap();
        assert_eq!(table.get("item-1").unwrap().unwrap().value(), 25);
    }
}
