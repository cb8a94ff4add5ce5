#![cfg(feature = "sqlite")]

use bundles_core::error::{BundleError, StorageError};
use bundles_core::id::{Address, BundleId};
use bundles_core::manifest::AssetManifest;
use bundles_core::objects::BundleRecord;
use bundles_custody::{CustodyLedger, CustodyStorage, SqliteCustodyStorage};
use tempfile::tempdir;

fn manifest(native: u128) -> AssetManifest {
    AssetManifest::new(native)
        .with_fungible(Address::named("token"), 50)
        .with_unique(Address::named("kitties"), 42)
        .with_multi(Address::named("items"), 1, 10)
}

#[test]
fn test_basic_storage_operations() {
    let dir = tempdir().unwrap();
    let storage = SqliteCustodyStorage::new(dir.path().join("custody.db")).unwrap();

    let record = BundleRecord::new(BundleId(0), manifest(100));
    storage.insert(&record).unwrap();

    assert_eq!(storage.get(BundleId(0)).unwrap(), Some(record.clone()));
    assert_eq!(storage.len().unwrap(), 1);

    assert_eq!(storage.remove(BundleId(0)).unwrap(), Some(record));
    assert!(storage.get(BundleId(0)).unwrap().is_none());
    assert!(storage.remove(BundleId(0)).unwrap().is_none());
    assert!(storage.is_empty().unwrap());
}

#[test]
fn test_duplicate_insert_is_rejected() {
    let dir = tempdir().unwrap();
    let storage = SqliteCustodyStorage::new(dir.path().join("custody.db")).unwrap();

    storage
        .insert(&BundleRecord::new(BundleId(7), manifest(1)))
        .unwrap();
    let result = storage.insert(&BundleRecord::new(BundleId(7), manifest(2)));
    assert!(matches!(result, Err(StorageError::Duplicate(BundleId(7)))));

    // First write wins
    assert_eq!(
        storage.get(BundleId(7)).unwrap().unwrap().manifest,
        manifest(1)
    );
}

#[test]
fn test_scan_operations() {
    let dir = tempdir().unwrap();
    let storage = SqliteCustodyStorage::new(dir.path().join("custody.db")).unwrap();

    for id in [3u64, 1, 2] {
        storage
            .insert(&BundleRecord::new(BundleId(id), manifest(id as u128)))
            .unwrap();
    }

    let records: Vec<BundleRecord> = storage.scan().map(|r| r.unwrap()).collect();
    let ids: Vec<u64> = records.iter().map(|r| r.id.value()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(records[2].manifest, manifest(3));
}

#[test]
fn test_state_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("custody.db");

    {
        let storage = SqliteCustodyStorage::new(&path).unwrap();
        storage
            .insert(&BundleRecord::new(BundleId(4), manifest(9)))
            .unwrap();
        storage.set_issued_count(5).unwrap();
    }

    let storage = SqliteCustodyStorage::new(&path).unwrap();
    assert_eq!(storage.issued_count().unwrap(), 5);
    assert_eq!(
        storage.get(BundleId(4)).unwrap().unwrap().manifest,
        manifest(9)
    );
}

#[test]
fn test_ledger_over_sqlite() {
    let dir = tempdir().unwrap();
    let storage = SqliteCustodyStorage::new(dir.path().join("custody.db")).unwrap();
    let ledger = CustodyLedger::new(storage);

    ledger.store(BundleId(0), manifest(0)).unwrap();
    assert!(matches!(
        ledger.store(BundleId(0), manifest(0)),
        Err(BundleError::DuplicateIdentifier(BundleId(0)))
    ));

    assert_eq!(ledger.take(BundleId(0)).unwrap(), manifest(0));
    assert!(matches!(
        ledger.take(BundleId(0)),
        Err(BundleError::UnknownIdentifier(BundleId(0)))
    ));
}
