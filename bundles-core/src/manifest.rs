//! Manifest codec.
//!
//! A bundle's contents travel as a flat pair of sequences, one of addresses
//! and one of numbers. The number sequence starts with a fixed header
//! `[native_amount, count_fungible, count_unique, count_multi]` followed by
//! four segments whose lengths are implied by the header:
//!
//! ```text
//! numbers:   [native, nf, nu, nm, fungible_amount * nf, unique_id * nu, multi_id * nm, multi_amount * nm]
//! addresses: [fungible_token * nf, unique_collection * nu, multi_collection * nm]
//! ```
//!
//! [`AssetManifest`] is the typed form used everywhere else; [`PackedManifest`]
//! is the wire and storage form.

use crate::error::{BundleError, BundleResult, StorageError};
use crate::id::Address;
use serde::{Deserialize, Serialize};

/// Number of header entries at the start of the number sequence
pub const HEADER_LEN: usize = 4;

/// A fungible-token deposit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FungibleAsset {
    /// Contract of the fungible token
    pub token: Address,
    /// Amount deposited, never zero
    pub amount: u128,
}

/// A unique-item deposit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueAsset {
    /// Contract of the item collection
    pub collection: Address,
    pub item_id: u128,
}

/// A multi-quantity (semi-fungible) deposit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiAsset {
    /// Contract of the multi-quantity collection
    pub collection: Address,
    pub item_id: u128,
    pub amount: u128,
}

/// Typed contents of one bundle.
///
/// Each list keeps deposit order, and withdrawal replays the same order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetManifest {
    /// Native currency escrowed with the bundle, may be zero
    pub native_amount: u128,
    pub fungible: Vec<FungibleAsset>,
    pub unique: Vec<UniqueAsset>,
    pub multi: Vec<MultiAsset>,
}

impl AssetManifest {
    /// Create an empty manifest carrying only native currency
    pub fn new(native_amount: u128) -> Self {
        Self {
            native_amount,
            ..Self::default()
        }
    }

    pub fn with_fungible(mut self, token: Address, amount: u128) -> Self {
        self.fungible.push(FungibleAsset { token, amount });
        self
    }

    pub fn with_unique(mut self, collection: Address, item_id: u128) -> Self {
        self.unique.push(UniqueAsset {
            collection,
            item_id,
        });
        self
    }

    pub fn with_multi(mut self, collection: Address, item_id: u128, amount: u128) -> Self {
        self.multi.push(MultiAsset {
            collection,
            item_id,
            amount,
        });
        self
    }

    /// Number of non-native asset entries
    pub fn asset_count(&self) -> usize {
        self.fungible.len() + self.unique.len() + self.multi.len()
    }

    /// Unpack the flat representation, checking the structural invariants
    /// before anything else looks at the data.
    ///
    /// # Errors
    /// * `MalformedManifest` - the header is missing, or the sequence lengths
    ///   disagree with the header counts
    /// * `ZeroAmountAsset` - a fungible amount is zero
    pub fn decode(addresses: &[Address], numbers: &[u128]) -> BundleResult<Self> {
        if numbers.len() < HEADER_LEN {
            return Err(BundleError::malformed(format!(
                "number sequence has {} entries, header needs {}",
                numbers.len(),
                HEADER_LEN
            )));
        }

        let native_amount = numbers[0];
        let fungible_count = segment_len(numbers[1], "fungible")?;
        let unique_count = segment_len(numbers[2], "unique")?;
        let multi_count = segment_len(numbers[3], "multi")?;

        // The multi segment appears twice in the numbers: once for ids, once for amounts
        let expected_numbers = HEADER_LEN
            .checked_add(fungible_count)
            .and_then(|n| n.checked_add(unique_count))
            .and_then(|n| n.checked_add(multi_count))
            .and_then(|n| n.checked_add(multi_count))
            .ok_or_else(|| BundleError::malformed("header counts overflow"))?;

        if numbers.len() != expected_numbers {
            return Err(BundleError::malformed(format!(
                "expected {} numbers, found {}",
                expected_numbers,
                numbers.len()
            )));
        }

        // Cannot overflow, it is smaller than expected_numbers
        let expected_addresses = fungible_count + unique_count + multi_count;
        if addresses.len() != expected_addresses {
            return Err(BundleError::malformed(format!(
                "expected {} addresses, found {}",
                expected_addresses,
                addresses.len()
            )));
        }

        let body = &numbers[HEADER_LEN..];
        let (fungible_amounts, body) = body.split_at(fungible_count);
        let (unique_ids, body) = body.split_at(unique_count);
        let (multi_ids, multi_amounts) = body.split_at(multi_count);

        if let Some(index) = fungible_amounts.iter().position(|amount| *amount == 0) {
            return Err(BundleError::ZeroAmountAsset { index });
        }

        let (fungible_tokens, rest) = addresses.split_at(fungible_count);
        let (unique_collections, multi_collections) = rest.split_at(unique_count);

        let fungible = fungible_tokens
            .iter()
            .zip(fungible_amounts)
            .map(|(token, amount)| FungibleAsset {
                token: *token,
                amount: *amount,
            })
            .collect();

        let unique = unique_collections
            .iter()
            .zip(unique_ids)
            .map(|(collection, item_id)| UniqueAsset {
                collection: *collection,
                item_id: *item_id,
            })
            .collect();

        let multi = multi_collections
            .iter()
            .zip(multi_ids.iter().zip(multi_amounts))
            .map(|(collection, (item_id, amount))| MultiAsset {
                collection: *collection,
                item_id: *item_id,
                amount: *amount,
            })
            .collect();

        Ok(Self {
            native_amount,
            fungible,
            unique,
            multi,
        })
    }

    /// Pack into the flat representation. Always decodes back to `self`
    /// provided no fungible amount is zero.
    pub fn encode(&self) -> PackedManifest {
        let mut addresses = Vec::with_capacity(self.asset_count());
        addresses.extend(self.fungible.iter().map(|asset| asset.token));
        addresses.extend(self.unique.iter().map(|asset| asset.collection));
        addresses.extend(self.multi.iter().map(|asset| asset.collection));

        let mut numbers = Vec::with_capacity(HEADER_LEN + self.asset_count() + self.multi.len());
        numbers.push(self.native_amount);
        numbers.push(self.fungible.len() as u128);
        numbers.push(self.unique.len() as u128);
        numbers.push(self.multi.len() as u128);
        numbers.extend(self.fungible.iter().map(|asset| asset.amount));
        numbers.extend(self.unique.iter().map(|asset| asset.item_id));
        numbers.extend(self.multi.iter().map(|asset| asset.item_id));
        numbers.extend(self.multi.iter().map(|asset| asset.amount));

        PackedManifest { addresses, numbers }
    }
}

fn segment_len(count: u128, segment: &str) -> BundleResult<usize> {
    usize::try_from(count)
        .map_err(|_| BundleError::malformed(format!("{} count {} out of range", segment, count)))
}

/// Flat wire/storage form of a manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedManifest {
    pub addresses: Vec<Address>,
    pub numbers: Vec<u128>,
}

impl PackedManifest {
    /// Decode into the typed form, see [`AssetManifest::decode`]
    pub fn decode(&self) -> BundleResult<AssetManifest> {
        AssetManifest::decode(&self.addresses, &self.numbers)
    }

    /// Declared native amount, if the header is present
    pub fn native_amount(&self) -> Option<u128> {
        self.numbers.first().copied()
    }

    /// Serialize for storage
    pub fn to_bytes(&self) -> Result<Vec<u8>, StorageError> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize from storage
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> Address {
        Address::named("token")
    }

    fn kitties() -> Address {
        Address::named("kitties")
    }

    fn items() -> Address {
        Address::named("items")
    }

    fn mixed_manifest() -> AssetManifest {
        AssetManifest::new(100)
            .with_fungible(token(), 50)
            .with_fungible(Address::named("stable"), 7)
            .with_unique(kitties(), 42)
            .with_multi(items(), 1, 10)
            .with_multi(items(), 2, 20)
    }

    #[test]
    fn test_encode_layout() {
        let packed = mixed_manifest().encode();

        assert_eq!(
            packed.numbers,
            vec![100, 2, 1, 2, 50, 7, 42, 1, 2, 10, 20]
        );
        assert_eq!(
            packed.addresses,
            vec![token(), Address::named("stable"), kitties(), items(), items()]
        );
    }

    #[test]
    fn test_round_trip() {
        let manifests = vec![
            AssetManifest::new(0),
            AssetManifest::new(5),
            AssetManifest::new(0).with_unique(kitties(), 0),
            AssetManifest::new(0).with_multi(items(), 9, 0),
            mixed_manifest(),
        ];

        for manifest in manifests {
            let packed = manifest.encode();
            assert_eq!(packed.decode().unwrap(), manifest);
        }
    }

    #[test]
    fn test_decode_preserves_order() {
        let addresses = vec![items(), kitties()];
        let numbers = vec![0, 2, 0, 0, 3, 4];

        let manifest = AssetManifest::decode(&addresses, &numbers).unwrap();
        assert_eq!(manifest.fungible[0], FungibleAsset { token: items(), amount: 3 });
        assert_eq!(manifest.fungible[1], FungibleAsset { token: kitties(), amount: 4 });
    }

    #[test]
    fn test_decode_rejects_short_header() {
        let result = AssetManifest::decode(&[], &[1, 0, 0]);
        assert!(matches!(result, Err(BundleError::MalformedManifest(_))));
    }

    #[test]
    fn test_decode_rejects_number_count_mismatch() {
        // One fungible declared, but its amount is missing
        let result = AssetManifest::decode(&[token()], &[0, 1, 0, 0]);
        assert!(matches!(result, Err(BundleError::MalformedManifest(_))));

        // Multi items need both an id and an amount
        let result = AssetManifest::decode(&[items()], &[0, 0, 0, 1, 5]);
        assert!(matches!(result, Err(BundleError::MalformedManifest(_))));

        // Trailing garbage
        let result = AssetManifest::decode(&[], &[0, 0, 0, 0, 1]);
        assert!(matches!(result, Err(BundleError::MalformedManifest(_))));
    }

    #[test]
    fn test_decode_rejects_address_count_mismatch() {
        let result = AssetManifest::decode(&[token(), token()], &[0, 1, 0, 0, 5]);
        assert!(matches!(result, Err(BundleError::MalformedManifest(_))));

        let result = AssetManifest::decode(&[], &[0, 0, 1, 0, 5]);
        assert!(matches!(result, Err(BundleError::MalformedManifest(_))));
    }

    #[test]
    fn test_decode_rejects_huge_counts() {
        let result = AssetManifest::decode(&[], &[0, u128::MAX, 0, 0]);
        assert!(matches!(result, Err(BundleError::MalformedManifest(_))));

        let half = (usize::MAX / 2) as u128;
        let result = AssetManifest::decode(&[], &[0, 0, 0, half]);
        assert!(matches!(result, Err(BundleError::MalformedManifest(_))));
    }

    #[test]
    fn test_decode_rejects_zero_fungible_amount() {
        let addresses = vec![token(), Address::named("stable")];
        let numbers = vec![0, 2, 0, 0, 10, 0];

        let result = AssetManifest::decode(&addresses, &numbers);
        assert!(matches!(result, Err(BundleError::ZeroAmountAsset { index: 1 })));
    }

    #[test]
    fn test_packed_bytes_round_trip() {
        let packed = mixed_manifest().encode();
        let bytes = packed.to_bytes().unwrap();
        assert_eq!(PackedManifest::from_bytes(&bytes).unwrap(), packed);
        assert_eq!(packed.native_amount(), Some(100));
    }
}
