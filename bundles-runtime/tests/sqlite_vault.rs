mod common;

use bundles_core::error::BundleError;
use bundles_core::id::BundleId;
use bundles_core::manifest::AssetManifest;
use bundles_custody::SqliteCustodyStorage;
use tempfile::tempdir;

use common::*;

#[test]
fn test_vault_survives_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("vault.db");
    let mut env = funded_env();

    let packed = packed(&mixed_manifest(3));
    let single = AssetManifest::new(1).encode();
    {
        let vault = vault_over(0, SqliteCustodyStorage::new(&path).unwrap());
        let first = vault
            .issue(&mut env, &alice(), &alice(), &packed.addresses, &packed.numbers, 3)
            .unwrap();
        vault
            .issue(&mut env, &alice(), &alice(), &single.addresses, &single.numbers, 1)
            .unwrap();
        vault.redeem(&mut env, &alice(), BundleId(1)).unwrap();
        assert_eq!(first, BundleId(0));
    }

    let vault = vault_over(0, SqliteCustodyStorage::new(&path).unwrap());
    assert_eq!(vault.total_issued(), 2);
    assert_eq!(vault.live_bundles().unwrap(), vec![BundleId(0)]);
    assert_eq!(vault.manifest_of(BundleId(0)).unwrap(), packed);

    // Identifiers keep counting from where the previous vault stopped
    let next = vault
        .issue(&mut env, &alice(), &alice(), &single.addresses, &single.numbers, 1)
        .unwrap();
    assert_eq!(next, BundleId(2));

    vault.redeem(&mut env, &alice(), BundleId(0)).unwrap();
    assert_eq!(env.unique_owner(&kitties(), 1), Some(alice()));
}

#[test]
fn test_rollback_reaches_the_database() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("vault.db");
    let mut env = funded_env();
    env.approve(&token(), &alice(), &vault_address(), 0);

    {
        let vault = vault_over(0, SqliteCustodyStorage::new(&path).unwrap());
        let packed = packed(&mixed_manifest(0));
        let result = vault.issue(&mut env, &alice(), &alice(), &packed.addresses, &packed.numbers, 0);
        assert!(matches!(result, Err(BundleError::Transfer(_))));
    }

    let vault = vault_over(0, SqliteCustodyStorage::new(&path).unwrap());
    assert_eq!(vault.total_issued(), 0);
    assert!(vault.live_bundles().unwrap().is_empty());
}

#[test]
fn test_failed_redeem_restores_record() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("vault.db");
    let mut env = funded_env();

    let vault = vault_over(0, SqliteCustodyStorage::new(&path).unwrap());
    let packed = packed(&mixed_manifest(8));
    let id = vault
        .issue(&mut env, &alice(), &alice(), &packed.addresses, &packed.numbers, 8)
        .unwrap();

    env.reject_native(&alice());
    assert!(vault.redeem(&mut env, &alice(), id).is_err());
    drop(vault);

    let vault = vault_over(0, SqliteCustodyStorage::new(&path).unwrap());
    assert_eq!(vault.manifest_of(id).unwrap(), packed);
    assert_eq!(vault.total_issued(), 1);
}
