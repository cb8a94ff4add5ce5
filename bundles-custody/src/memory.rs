use std::collections::BTreeMap;
use std::sync::Mutex;

use bundles_core::error::StorageError;
use bundles_core::id::BundleId;
use bundles_core::objects::BundleRecord;
use log::debug;

use crate::storage_traits::{CustodyStorage, CustodyStorageIterator};

/// In-memory implementation of custody storage
#[derive(Debug, Default)]
pub struct MemoryCustodyStorage {
    // Mapping from identifier to record
    records: Mutex<BTreeMap<BundleId, BundleRecord>>,

    // Total identifiers ever issued
    issued: Mutex<u64>,
}

impl MemoryCustodyStorage {
    /// Create a new, empty in-memory storage
    pub fn new() -> Self {
        Self::default()
    }

    fn records(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<BundleId, BundleRecord>>, StorageError> {
        self.records
            .lock()
            .map_err(|e| StorageError::Other(format!("Failed to acquire lock: {}", e)))
    }
}

/// Iterator implementation for in-memory records
pub struct MemoryCustodyIterator {
    records: Vec<BundleRecord>,
    current_index: usize,
    // Reported once, in place of any record, when the snapshot could not be taken
    error: Option<StorageError>,
}

impl Iterator for MemoryCustodyIterator {
    type Item = Result<BundleRecord, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(error) = self.error.take() {
            return Some(Err(error));
        }

        let record = self.records.get(self.current_index)?.clone();
        self.current_index += 1;
        Some(Ok(record))
    }
}

impl CustodyStorageIterator for MemoryCustodyIterator {}

impl CustodyStorage for MemoryCustodyStorage {
    fn get(&self, id: BundleId) -> Result<Option<BundleRecord>, StorageError> {
        Ok(self.records()?.get(&id).cloned())
    }

    fn insert(&self, record: &BundleRecord) -> Result<(), StorageError> {
        let mut records = self.records()?;
        if records.contains_key(&record.id) {
            return Err(StorageError::Duplicate(record.id));
        }

        debug!("storing {} in memory", record.id);
        records.insert(record.id, record.clone());
        Ok(())
    }

    fn remove(&self, id: BundleId) -> Result<Option<BundleRecord>, StorageError> {
        Ok(self.records()?.remove(&id))
    }

    fn scan(&self) -> Box<dyn CustodyStorageIterator + '_> {
        // Snapshot the records so the lock is not held while iterating
        let (records, error) = match self.records() {
            Ok(records) => (records.values().cloned().collect(), None),
            Err(e) => (Vec::new(), Some(e)),
        };

        Box::new(MemoryCustodyIterator {
            records,
            current_index: 0,
            error,
        })
    }

    fn len(&self) -> Result<usize, StorageError> {
        Ok(self.records()?.len())
    }

    fn issued_count(&self) -> Result<u64, StorageError> {
        self.issued
            .lock()
            .map(|issued| *issued)
            .map_err(|e| StorageError::Other(format!("Failed to acquire lock: {}", e)))
    }

    fn set_issued_count(&self, count: u64) -> Result<(), StorageError> {
        let mut issued = self
            .issued
            .lock()
            .map_err(|e| StorageError::Other(format!("Failed to acquire lock: {}", e)))?;
        *issued = count;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundles_core::id::Address;
    use bundles_core::manifest::AssetManifest;
    use std::sync::Arc;
    use std::thread;

    fn record(id: u64) -> BundleRecord {
        let manifest = AssetManifest::new(id as u128).with_fungible(Address::named("token"), 5);
        BundleRecord::new(BundleId(id), manifest)
    }

    #[test]
    fn test_basic_storage_operations() {
        let storage = MemoryCustodyStorage::new();
        let rec = record(1);

        storage.insert(&rec).unwrap();
        assert_eq!(storage.get(BundleId(1)).unwrap(), Some(rec.clone()));
        assert_eq!(storage.len().unwrap(), 1);

        assert_eq!(storage.remove(BundleId(1)).unwrap(), Some(rec));
        assert!(storage.get(BundleId(1)).unwrap().is_none());
        assert!(storage.is_empty().unwrap());

        // Removing twice yields nothing
        assert!(storage.remove(BundleId(1)).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_insert_is_rejected() {
        let storage = MemoryCustodyStorage::new();
        storage.insert(&record(3)).unwrap();

        let result = storage.insert(&record(3));
        assert!(matches!(result, Err(StorageError::Duplicate(BundleId(3)))));
    }

    #[test]
    fn test_scan_in_identifier_order() {
        let storage = MemoryCustodyStorage::new();
        for id in [4, 0, 2] {
            storage.insert(&record(id)).unwrap();
        }

        let ids: Vec<u64> = storage
            .scan()
            .map(|record| record.unwrap().id.value())
            .collect();
        assert_eq!(ids, vec![0, 2, 4]);
    }

    #[test]
    fn test_scan_reports_poisoned_lock() {
        let storage = Arc::new(MemoryCustodyStorage::new());
        storage.insert(&record(1)).unwrap();

        let holder = storage.clone();
        let _ = thread::spawn(move || {
            let _records = holder.records.lock().unwrap();
            panic!("writer died while holding the records lock");
        })
        .join();

        let items: Vec<_> = storage.scan().collect();
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(StorageError::Other(_))));

        let collected: Result<Vec<_>, _> = storage.scan().collect();
        assert!(collected.is_err());
        assert!(matches!(storage.len(), Err(StorageError::Other(_))));
    }

    #[test]
    fn test_issued_count() {
        let storage = MemoryCustodyStorage::new();
        assert_eq!(storage.issued_count().unwrap(), 0);

        storage.set_issued_count(9).unwrap();
        assert_eq!(storage.issued_count().unwrap(), 9);
    }
}
