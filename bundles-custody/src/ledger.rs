use bundles_core::error::{BundleError, BundleResult, StorageError};
use bundles_core::id::BundleId;
use bundles_core::manifest::AssetManifest;
use bundles_core::objects::BundleRecord;
use log::debug;

use crate::storage_traits::CustodyStorage;

/// Maps each live claim-token identifier to the manifest held in custody.
///
/// The ledger is the only authority on whether an identifier is still
/// redeemable. It sits on top of any [`CustodyStorage`] backend.
#[derive(Debug)]
pub struct CustodyLedger<S: CustodyStorage> {
    storage: S,
}

impl<S: CustodyStorage> CustodyLedger<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Access the underlying backend
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Create the record for a freshly issued bundle
    ///
    /// # Errors
    /// `DuplicateIdentifier` if a record already exists. The supply guard never
    /// hands out an identifier twice, so this only fires on a corrupted store.
    pub fn store(&self, id: BundleId, manifest: AssetManifest) -> BundleResult<()> {
        let record = BundleRecord::new(id, manifest);
        match self.storage.insert(&record) {
            Ok(()) => {
                debug!("custody record created for {}", id);
                Ok(())
            }
            Err(StorageError::Duplicate(id)) => Err(BundleError::DuplicateIdentifier(id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove the record and hand back its manifest in one step
    ///
    /// # Errors
    /// `UnknownIdentifier` if no record exists
    pub fn take(&self, id: BundleId) -> BundleResult<AssetManifest> {
        let record = self
            .storage
            .remove(id)?
            .ok_or(BundleError::UnknownIdentifier(id))?;
        debug!("custody record released for {}", id);
        Ok(record.manifest)
    }

    /// Read a manifest without touching the record
    pub fn get(&self, id: BundleId) -> BundleResult<AssetManifest> {
        self.storage
            .get(id)?
            .map(|record| record.manifest)
            .ok_or(BundleError::UnknownIdentifier(id))
    }

    pub fn contains(&self, id: BundleId) -> BundleResult<bool> {
        Ok(self.storage.get(id)?.is_some())
    }

    /// All live records in identifier order
    pub fn records(&self) -> BundleResult<Vec<BundleRecord>> {
        let records = self.storage.scan().collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Put a record back exactly as it was, used when undoing a `take`
    pub fn reinstate(&self, record: &BundleRecord) -> BundleResult<()> {
        self.storage.insert(record)?;
        Ok(())
    }

    /// Drop a record without reading it, used when undoing a `store`
    pub fn discard(&self, id: BundleId) -> BundleResult<()> {
        self.storage.remove(id)?;
        Ok(())
    }
}
