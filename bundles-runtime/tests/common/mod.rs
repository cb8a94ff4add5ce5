#![allow(dead_code)]

use bundles_core::id::Address;
use bundles_core::manifest::{AssetManifest, PackedManifest};
use bundles_custody::{CustodyStorage, MemoryCustodyStorage};
use bundles_runtime::{BundleVault, MockEnvironment, VaultConfig};

pub const NATIVE: u128 = 1_000;
pub const TOKENS: u128 = 500;
pub const ITEM_QUANTITY: u128 = 20;

/// Multi-quantity item id held by alice
pub const ITEM: u128 = 9;

pub fn vault_address() -> Address {
    Address::named("vault")
}

pub fn alice() -> Address {
    Address::named("alice")
}

pub fn bob() -> Address {
    Address::named("bob")
}

pub fn carol() -> Address {
    Address::named("carol")
}

pub fn token() -> Address {
    Address::named("token")
}

pub fn kitties() -> Address {
    Address::named("kitties")
}

pub fn items() -> Address {
    Address::named("items")
}

/// A world where alice holds every kind of asset and has approved the vault
pub fn funded_env() -> MockEnvironment {
    let mut env = MockEnvironment::new();
    let vault = vault_address();

    env.mint_native(&alice(), NATIVE);
    env.mint_fungible(&token(), &alice(), TOKENS);
    env.approve(&token(), &alice(), &vault, TOKENS);

    env.mint_unique(&kitties(), &alice(), 1);
    env.mint_unique(&kitties(), &alice(), 2);
    env.set_unique_operator(&kitties(), &alice(), &vault, true);

    env.mint_multi(&items(), &alice(), ITEM, ITEM_QUANTITY);
    env.set_multi_operator(&items(), &alice(), &vault, true);

    env
}

pub fn config(cap: u64) -> VaultConfig {
    VaultConfig::new(vault_address())
        .with_supply_cap(cap)
        .with_metadata_uri("ipfs://bundle-metadata")
}

pub fn memory_vault(cap: u64) -> BundleVault<MemoryCustodyStorage> {
    BundleVault::new(config(cap), MemoryCustodyStorage::new()).unwrap()
}

pub fn vault_over<S: CustodyStorage>(cap: u64, storage: S) -> BundleVault<S> {
    BundleVault::new(config(cap), storage).unwrap()
}

/// One of each asset kind plus `native` currency
pub fn mixed_manifest(native: u128) -> AssetManifest {
    AssetManifest::new(native)
        .with_fungible(token(), 50)
        .with_unique(kitties(), 1)
        .with_multi(items(), ITEM, 5)
}

pub fn packed(manifest: &AssetManifest) -> PackedManifest {
    manifest.encode()
}
