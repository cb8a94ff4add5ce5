use bundles_core::error::StorageError;
use bundles_core::id::BundleId;
use bundles_core::objects::BundleRecord;

use std::iter::Iterator;

/// Iterator for traversing bundle records in storage
pub trait CustodyStorageIterator: Iterator<Item = Result<BundleRecord, StorageError>> {}

/// Storage interface for the records of live bundles
///
/// Implementations use interior mutability; every method takes `&self`.
pub trait CustodyStorage {
    /// Get the record stored for an identifier
    ///
    /// # Parameters
    /// * `id` - The identifier of the bundle
    ///
    /// # Returns
    /// Some(record) if the bundle is live, None otherwise
    fn get(&self, id: BundleId) -> Result<Option<BundleRecord>, StorageError>;

    /// Store a new record
    ///
    /// # Parameters
    /// * `record` - The record to store
    ///
    /// # Returns
    /// Ok(()) if stored, `StorageError::Duplicate` if the identifier already has a record
    fn insert(&self, record: &BundleRecord) -> Result<(), StorageError>;

    /// Remove the record for an identifier
    ///
    /// # Parameters
    /// * `id` - The identifier of the bundle
    ///
    /// # Returns
    /// The removed record, or None if nothing was stored
    fn remove(&self, id: BundleId) -> Result<Option<BundleRecord>, StorageError>;

    /// Create an iterator over all live records in identifier order
    fn scan(&self) -> Box<dyn CustodyStorageIterator + '_>;

    /// Number of live records
    fn len(&self) -> Result<usize, StorageError>;

    /// Check if no bundle is live
    fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }

    /// Total number of identifiers ever issued, persisted next to the records
    fn issued_count(&self) -> Result<u64, StorageError>;

    /// Persist the total number of identifiers ever issued
    fn set_issued_count(&self, count: u64) -> Result<(), StorageError>;
}
