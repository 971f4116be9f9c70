//! Generic workflow engine over redb
//!
//! One engine instance per record kind, pointed at its redb table. The
//! read-validate-append window of a transition runs inside a single write
//! transaction, so concurrent writers on the same record serialize; a
//! caller holding a stale copy loses with `ConcurrentModification` and may
//! retry against the refreshed record.

use super::record::{StatusEntry, WorkflowRecord};
use super::state::WorkflowState;
use crate::storage::{CoreStorage, StorageError};
use redb::{ReadableTable, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::util::now_millis;
use std::marker::PhantomData;
use thiserror::Error;

/// Workflow errors
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Record already exists: {0}")]
    Duplicate(String),

    /// Illegal status change; the record is unchanged
    #[error("invalid transition for {id}: {from} -> {to}")]
    InvalidTransition {
        id: String,
        from: String,
        to: String,
    },

    /// Lost a race on the record; reload and retry
    #[error("concurrent modification of {id}: expected version {expected}, found {actual}")]
    ConcurrentModification {
        id: String,
        expected: u64,
        actual: u64,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Status state machine and audit trail, generic over the state type and
/// the domain payload
pub struct WorkflowEngine<S, P> {
    storage: CoreStorage,
    table: TableDefinition<'static, &'static str, &'static [u8]>,
    _marker: PhantomData<fn() -> (S, P)>,
}

impl<S, P> Clone for WorkflowEngine<S, P> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            table: self.table,
            _marker: PhantomData,
        }
    }
}

impl<S, P> std::fmt::Debug for WorkflowEngine<S, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowEngine").finish()
    }
}

impl<S, P> WorkflowEngine<S, P>
where
    S: WorkflowState,
    P: Serialize + DeserializeOwned,
{
    pub fn new(
        storage: CoreStorage,
        table: TableDefinition<'static, &'static str, &'static [u8]>,
    ) -> Self {
        Self {
            storage,
            table,
            _marker: PhantomData,
        }
    }

    /// Create a record in the initial state
    ///
    /// The first history entry is written here; entering the initial state
    /// is not a separate transition call.
    pub fn create(&self, id: &str, payload: P) -> WorkflowResult<WorkflowRecord<S, P>> {
        let now = now_millis();
        let record = WorkflowRecord {
            id: id.to_string(),
            status: S::initial(),
            history: vec![StatusEntry {
                status: S::initial(),
                timestamp: now,
                note: None,
                actor: None,
            }],
            version: 1,
            created_at: now,
            completed_at: None,
            payload,
        };

        let txn = self.storage.begin_write()?;
        {
            let mut table = txn.open_table(self.table).map_err(StorageError::from)?;
            if table.get(id).map_err(StorageError::from)?.is_some() {
                return Err(WorkflowError::Duplicate(id.to_string()));
            }
            let value = serde_json::to_vec(&record).map_err(StorageError::from)?;
            table
                .insert(id, value.as_slice())
                .map_err(StorageError::from)?;
        }
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(record_id = %id, status = %record.status, "Workflow record created");
        Ok(record)
    }

    /// Apply a status transition
    ///
    /// `expected_version` is the version of the record the caller read.
    /// On success the new history entry is appended, the version bumps,
    /// and `completed_at` is stamped on first entry to a completion state.
    /// On any error the stored record is untouched.
    pub fn transition(
        &self,
        id: &str,
        expected_version: u64,
        next: S,
        note: Option<String>,
        actor: Option<String>,
    ) -> WorkflowResult<WorkflowRecord<S, P>> {
        let txn = self.storage.begin_write()?;
        let record = {
            let mut table = txn.open_table(self.table).map_err(StorageError::from)?;

            let mut record: WorkflowRecord<S, P> = match table.get(id).map_err(StorageError::from)?
            {
                Some(guard) => {
                    serde_json::from_slice(guard.value()).map_err(StorageError::from)?
                }
                None => return Err(WorkflowError::NotFound(id.to_string())),
            };

            if record.version != expected_version {
                return Err(WorkflowError::ConcurrentModification {
                    id: id.to_string(),
                    expected: expected_version,
                    actual: record.version,
                });
            }

            if !record.status.can_transition(next) {
                return Err(WorkflowError::InvalidTransition {
                    id: id.to_string(),
                    from: record.status.to_string(),
                    to: next.to_string(),
                });
            }

            let now = now_millis();
            record.history.push(StatusEntry {
                status: next,
                timestamp: now,
                note,
                actor,
            });
            record.status = next;
            record.version += 1;
            if next.stamps_completion() && record.completed_at.is_none() {
                record.completed_at = Some(now);
            }

            let value = serde_json::to_vec(&record).map_err(StorageError::from)?;
            table
                .insert(id, value.as_slice())
                .map_err(StorageError::from)?;
            record
        };
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(record_id = %id, status = %record.status, version = record.version, "Status transition applied");
        Ok(record)
    }

    /// Load a record by identifier
    pub fn get(&self, id: &str) -> WorkflowResult<Option<WorkflowRecord<S, P>>> {
        let read_txn = self.storage.begin_read()?;
        let table = read_txn.open_table(self.table).map_err(StorageError::from)?;
        match table.get(id).map_err(StorageError::from)? {
            Some(guard) => {
                let record = serde_json::from_slice(guard.value()).map_err(StorageError::from)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// All records in the table, in key order
    pub fn list(&self) -> WorkflowResult<Vec<WorkflowRecord<S, P>>> {
        let read_txn = self.storage.begin_read()?;
        let table = read_txn.open_table(self.table).map_err(StorageError::from)?;

        let mut records = Vec::new();
        for result in table.iter().map_err(StorageError::from)? {
            let (_key, value) = result.map_err(StorageError::from)?;
            let record = serde_json::from_slice(value.value()).map_err(StorageError::from)?;
            records.push(record);
        }
        Ok(records)
    }
}
