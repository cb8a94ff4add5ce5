use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::ops::Deref;

// Address identifies an account, an asset contract or the vault itself.
// It is a 32 byte long identifier, resembling a public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address([u8; 32]);

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format as a hex string with a prefix of the first 6 bytes
        let prefix = hex::encode(&self.0[0..6]);
        write!(f, "addr:{}", prefix)
    }
}

impl Default for Address {
    fn default() -> Self {
        Address::NULL
    }
}

impl Deref for Address {
    type Target = [u8; 32];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Address {
    /// The null address. Never a valid recipient.
    pub const NULL: Address = Address([0; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Address(bytes)
    }

    /// Create an Address from a byte slice, `None` unless it is exactly 32 bytes
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let array: [u8; 32] = bytes.try_into().ok()?;
        Some(Address(array))
    }

    /// Get a reference to the internal bytes
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_null(&self) -> bool {
        self.0 == [0; 32]
    }

    /// Derive a deterministic address from a list of seeds
    pub fn derive(seeds: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();

        // Domain separator
        hasher.update(b"BUNDLES_Address");

        for seed in seeds {
            hasher.update(seed);
        }

        Address(hasher.finalize().into())
    }

    /// Lowercase hex of all 32 bytes
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse 64 hex characters, with or without a `0x` prefix
    pub fn from_hex(s: &str) -> Option<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).ok()?;
        Self::from_slice(&bytes)
    }

    /// Derive an address from a human readable label, handy for fixtures
    pub fn named(label: &str) -> Self {
        Self::derive(&[label.as_bytes()])
    }
}

/// Identifier of a claim token and of the bundle it redeems.
///
/// Identifiers are handed out by the supply guard from a counter starting at
/// zero and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BundleId(pub u64);

impl BundleId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BundleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bundle#{}", self.0)
    }
}

impl From<u64> for BundleId {
    fn from(value: u64) -> Self {
        BundleId(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_address() {
        assert!(Address::NULL.is_null());
        assert!(Address::default().is_null());
        assert!(!Address::named("alice").is_null());
    }

    #[test]
    fn test_derive_is_deterministic() {
        let a = Address::derive(&[b"seed_1", b"seed_2"]);
        let b = Address::derive(&[b"seed_1", b"seed_2"]);
        assert_eq!(a, b);

        // Seed order matters
        let c = Address::derive(&[b"seed_2", b"seed_1"]);
        assert_ne!(a, c);
    }

    #[test]
    fn test_from_slice() {
        let addr = Address::named("token");
        assert_eq!(Address::from_slice(addr.bytes()), Some(addr));
        assert_eq!(Address::from_slice(&[1u8; 31]), None);
    }

    #[test]
    fn test_hex() {
        let addr = Address::named("vault");
        assert_eq!(Address::from_hex(&addr.to_hex()), Some(addr));
        assert_eq!(Address::from_hex(&format!("0x{}", addr.to_hex())), Some(addr));
        assert_eq!(Address::from_hex("abcd"), None);
        assert_eq!(Address::from_hex("not hex"), None);
    }

    #[test]
    fn test_display() {
        let addr = Address::new([0xab; 32]);
        assert_eq!(addr.to_string(), "addr:abababababab");
        assert_eq!(BundleId(7).to_string(), "bundle#7");
    }
}
