//! Date-scoped identifier minting
//!
//! Order and application numbers are human-readable strings with a public
//! format: `{prefix}{YYMMDD}{seq:04}`, e.g. `JS2501140007`. Uniqueness is
//! guaranteed by a per-(prefix, date) counter persisted in redb and bumped
//! inside a single write transaction, never by scanning for the highest
//! existing number, which races under concurrent callers.
//!
//! Gaps are permitted: a checkout that fails after minting keeps its slot.

use crate::storage::{CoreStorage, SEQUENCES_TABLE, StorageError};
use chrono::NaiveDate;
use redb::ReadableTable;
use thiserror::Error;

/// Daily sequence space: 4 zero-padded digits
const MAX_DAILY_SEQUENCE: u64 = 9999;

/// Minting errors
#[derive(Debug, Error)]
pub enum MintError {
    /// The 4-digit daily space is spent; requires operator intervention
    #[error("sequence exhausted for {counter_key}: {MAX_DAILY_SEQUENCE} identifiers per day")]
    ExhaustedSequence { counter_key: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type MintResult<T> = Result<T, MintError>;

/// Mints collision-free, date-scoped sequence identifiers
#[derive(Debug, Clone)]
pub struct SequenceMinter {
    storage: CoreStorage,
}

impl SequenceMinter {
    pub fn new(storage: CoreStorage) -> Self {
        Self { storage }
    }

    /// Mint the next identifier for (prefix, date)
    ///
    /// Safe under concurrent callers: the counter read and bump happen in
    /// one write transaction, and redb serializes writers.
    pub fn mint(&self, prefix: &str, date: NaiveDate) -> MintResult<String> {
        let counter_key = format!("{}{}", prefix, date.format("%y%m%d"));

        let txn = self.storage.begin_write()?;
        let next = {
            let mut table = txn
                .open_table(SEQUENCES_TABLE)
                .map_err(StorageError::from)?;
            let current = table
                .get(counter_key.as_str())
                .map_err(StorageError::from)?
                .map(|g| g.value())
                .unwrap_or(0);
            if current >= MAX_DAILY_SEQUENCE {
                // Transaction dropped without commit; counter stays put
                return Err(MintError::ExhaustedSequence { counter_key });
            }
            let next = current + 1;
            table
                .insert(counter_key.as_str(), next)
                .map_err(StorageError::from)?;
            next
        };
        txn.commit().map_err(StorageError::from)?;

        Ok(format!("{}{:04}", counter_key, next))
    }

    /// Last allocated sequence for (prefix, date), 0 if none yet
    pub fn current_sequence(&self, prefix: &str, date: NaiveDate) -> MintResult<u64> {
        let counter_key = format!("{}{}", prefix, date.format("%y%m%d"));
        let read_txn = self.storage.begin_read()?;
        let table = read_txn
            .open_table(SEQUENCES_TABLE)
            .map_err(StorageError::from)?;
        Ok(table
            .get(counter_key.as_str())
            .map_err(StorageError::from)?
            .map(|g| g.value())
            .unwrap_or(0))
    }
}
