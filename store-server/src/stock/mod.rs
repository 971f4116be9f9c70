//! Inventory stock ledger
//!
//! Tracks available quantity per catalog item and performs the atomic
//! reservation at checkout time. A reservation request is all-or-nothing:
//! every line is validated against availability before any decrement, and
//! the whole batch commits in one write transaction. Available quantity
//! never goes below zero.

use crate::storage::{CoreStorage, STOCK_TABLE, StorageError};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One line of a reservation or release request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockRequest {
    pub catalog_id: String,
    pub quantity: u32,
}

impl StockRequest {
    pub fn new(catalog_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            catalog_id: catalog_id.into(),
            quantity,
        }
    }
}

/// A line that could not be reserved
///
/// `requested` is the combined quantity across all request lines for the
/// catalog ID.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Shortage {
    pub catalog_id: String,
    pub requested: u64,
    pub available: u64,
}

/// Stock ledger errors
#[derive(Debug, Error)]
pub enum StockError {
    /// One or more lines exceed availability; nothing was reserved
    #[error("insufficient stock: {}", .shortages.iter()
        .map(|s| format!("{} (requested {}, available {})", s.catalog_id, s.requested, s.available))
        .collect::<Vec<_>>()
        .join(", "))]
    Insufficient { shortages: Vec<Shortage> },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type StockResult<T> = Result<T, StockError>;

/// Validates and reserves inventory against the catalog
#[derive(Debug, Clone)]
pub struct StockLedger {
    storage: CoreStorage,
}

impl StockLedger {
    pub fn new(storage: CoreStorage) -> Self {
        Self { storage }
    }

    /// Set the available quantity for a catalog item (seeding/restock)
    pub fn set_quantity(&self, catalog_id: &str, quantity: u64) -> StockResult<()> {
        let txn = self.storage.begin_write()?;
        {
            let mut table = txn.open_table(STOCK_TABLE).map_err(StorageError::from)?;
            table
                .insert(catalog_id, quantity)
                .map_err(StorageError::from)?;
        }
        txn.commit().map_err(StorageError::from)?;
        Ok(())
    }

    /// Available quantity for a catalog item (0 if unknown)
    pub fn quantity_of(&self, catalog_id: &str) -> StockResult<u64> {
        let read_txn = self.storage.begin_read()?;
        let table = read_txn.open_table(STOCK_TABLE).map_err(StorageError::from)?;
        Ok(table
            .get(catalog_id)
            .map_err(StorageError::from)?
            .map(|g| g.value())
            .unwrap_or(0))
    }

    /// Reserve the requested quantities, all-or-nothing
    ///
    /// Lines for the same catalog ID are summed, then every item is
    /// checked before any decrement. On failure the error names each
    /// failing item and nothing is reserved.
    pub fn reserve(&self, requests: &[StockRequest]) -> StockResult<()> {
        // Lines for the same item are combined up front; repeated IDs must
        // not each validate against the same availability snapshot
        let mut totals: Vec<(String, u64)> = Vec::new();
        for req in requests {
            match totals.iter_mut().find(|(id, _)| id == &req.catalog_id) {
                Some((_, qty)) => *qty += req.quantity as u64,
                None => totals.push((req.catalog_id.clone(), req.quantity as u64)),
            }
        }

        let txn = self.storage.begin_write()?;
        {
            let mut table = txn.open_table(STOCK_TABLE).map_err(StorageError::from)?;

            // Validate the whole batch first
            let mut available: Vec<u64> = Vec::with_capacity(totals.len());
            let mut shortages: Vec<Shortage> = Vec::new();
            for (catalog_id, requested) in &totals {
                let have = table
                    .get(catalog_id.as_str())
                    .map_err(StorageError::from)?
                    .map(|g| g.value())
                    .unwrap_or(0);
                if have < *requested {
                    shortages.push(Shortage {
                        catalog_id: catalog_id.clone(),
                        requested: *requested,
                        available: have,
                    });
                }
                available.push(have);
            }

            if !shortages.is_empty() {
                // Transaction dropped without commit; no line was touched
                tracing::warn!(failing = shortages.len(), "Stock reservation rejected");
                return Err(StockError::Insufficient { shortages });
            }

            for ((catalog_id, requested), have) in totals.iter().zip(available) {
                table
                    .insert(catalog_id.as_str(), have - requested)
                    .map_err(StorageError::from)?;
            }
        }
        txn.commit().map_err(StorageError::from)?;
        Ok(())
    }

    /// Restore previously reserved quantities (order cancellation)
    pub fn release(&self, requests: &[StockRequest]) -> StockResult<()> {
        let txn = self.storage.begin_write()?;
        {
            let mut table = txn.open_table(STOCK_TABLE).map_err(StorageError::from)?;
            for req in requests {
                let have = table
                    .get(req.catalog_id.as_str())
                    .map_err(StorageError::from)?
                    .map(|g| g.value())
                    .unwrap_or(0);
                table
                    .insert(req.catalog_id.as_str(), have + req.quantity as u64)
                    .map_err(StorageError::from)?;
            }
        }
        txn.commit().map_err(StorageError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> StockLedger {
        StockLedger::new(CoreStorage::open_in_memory().unwrap())
    }

    #[test]
    fn test_reserve_and_release() {
        let ledger = ledger();
        ledger.set_quantity("item-a", 10).unwrap();

        ledger.reserve(&[StockRequest::new("item-a", 4)]).unwrap();
        assert_eq!(ledger.quantity_of("item-a").unwrap(), 6);

        ledger.release(&[StockRequest::new("item-a", 4)]).unwrap();
        assert_eq!(ledger.quantity_of("item-a").unwrap(), 10);
    }

    #[test]
    fn test_all_or_nothing() {
        let ledger = ledger();
        ledger.set_quantity("item-a", 50).unwrap();
        ledger.set_quantity("item-b", 10).unwrap();

        let err = ledger
            .reserve(&[
                StockRequest::new("item-a", 5),
                StockRequest::new("item-b", 1000),
            ])
            .unwrap_err();

        match err {
            StockError::Insufficient { shortages } => {
                assert_eq!(shortages.len(), 1);
                assert_eq!(shortages[0].catalog_id, "item-b");
                assert_eq!(shortages[0].requested, 1000);
                assert_eq!(shortages[0].available, 10);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // Neither line was reserved
        assert_eq!(ledger.quantity_of("item-a").unwrap(), 50);
        assert_eq!(ledger.quantity_of("item-b").unwrap(), 10);
    }

    #[test]
    fn test_unknown_item_reports_zero_available() {
        let ledger = ledger();
        let err = ledger
            .reserve(&[StockRequest::new("ghost", 1)])
            .unwrap_err();
        match err {
            StockError::Insufficient { shortages } => {
                assert_eq!(shortages[0].available, 0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_lines_are_combined() {
        let ledger = ledger();
        ledger.set_quantity("item-a", 3).unwrap();

        // Two lines for the same item must be validated as their sum, not
        // each against the starting quantity
        let err = ledger
            .reserve(&[
                StockRequest::new("item-a", 2),
                StockRequest::new("item-a", 2),
            ])
            .unwrap_err();
        match err {
            StockError::Insufficient { shortages } => {
                assert_eq!(shortages.len(), 1);
                assert_eq!(shortages[0].catalog_id, "item-a");
                assert_eq!(shortages[0].requested, 4);
                assert_eq!(shortages[0].available, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(ledger.quantity_of("item-a").unwrap(), 3);

        // Within availability the combined total is decremented once
        ledger
            .reserve(&[
                StockRequest::new("item-a", 1),
                StockRequest::new("item-a", 2),
            ])
            .unwrap();
        assert_eq!(ledger.quantity_of("item-a").unwrap(), 0);
    }

    #[test]
    fn test_exact_depletion() {
        let ledger = ledger();
        ledger.set_quantity("item-a", 3).unwrap();

        ledger.reserve(&[StockRequest::new("item-a", 3)]).unwrap();
        assert_eq!(ledger.quantity_of("item-a").unwrap(), 0);

        // Next reservation must fail, never go negative
        assert!(ledger.reserve(&[StockRequest::new("item-a", 1)]).is_err());
    }

    #[test]
    fn test_concurrent_reservations_never_oversell() {
        let ledger = ledger();
        ledger.set_quantity("hot-item", 10).unwrap();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let ledger = ledger.clone();
            handles.push(std::thread::spawn(move || {
                ledger.reserve(&[StockRequest::new("hot-item", 1)]).is_ok()
            }));
        }

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        // Exactly the available quantity was handed out
        assert_eq!(successes, 10);
        assert_eq!(ledger.quantity_of("hot-item").unwrap(), 0);
    }
}
