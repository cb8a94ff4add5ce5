use std::path::Path;

use bundles_core::error::BundleError;
use bundles_core::id::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating a vault configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("custody address must not be the null address")]
    NullCustodyAddress,
}

/// Construction-time settings of a vault.
///
/// ```json
/// {
///   "custody_address": "<64 hex chars>",
///   "supply_cap": 1000,
///   "metadata_uri": "https://example.org/bundle.json"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Address the vault holds assets under
    #[serde(with = "address_hex")]
    pub custody_address: Address,

    /// Maximum number of claim tokens ever issued, 0 means unlimited
    #[serde(default)]
    pub supply_cap: u64,

    /// Metadata URI reported for every claim token
    #[serde(default)]
    pub metadata_uri: String,
}

impl VaultConfig {
    pub fn new(custody_address: Address) -> Self {
        Self {
            custody_address,
            supply_cap: 0,
            metadata_uri: String::new(),
        }
    }

    pub fn with_supply_cap(mut self, supply_cap: u64) -> Self {
        self.supply_cap = supply_cap;
        self
    }

    pub fn with_metadata_uri(mut self, metadata_uri: impl Into<String>) -> Self {
        self.metadata_uri = metadata_uri.into();
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: VaultConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.custody_address.is_null() {
            return Err(ConfigError::NullCustodyAddress);
        }
        Ok(())
    }
}

impl From<ConfigError> for BundleError {
    fn from(err: ConfigError) -> Self {
        BundleError::InvalidConfig(err.to_string())
    }
}

mod address_hex {
    use bundles_core::id::Address;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(address: &Address, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&address.to_hex())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Address, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_hex(&s)
            .ok_or_else(|| D::Error::custom(format!("invalid address `{}`: expected 32 hex bytes", s)))
    }
}
