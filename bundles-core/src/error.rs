use crate::id::BundleId;
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with custody storage
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database errors that occur with the underlying storage backend
    #[error("Database error: {0}")]
    Database(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Errors related to missing or invalid data
    #[error("Not found: {0}")]
    NotFound(String),

    /// A record with the same identifier is already stored
    #[error("Duplicate record: {0}")]
    Duplicate(BundleId),

    /// Generic errors that don't fit in other categories
    #[error("Other error: {0}")]
    Other(String),

    /// Anyhow error wrapper for error context
    #[error(transparent)]
    Context(#[from] anyhow::Error),
}

impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

impl From<String> for StorageError {
    fn from(err: String) -> Self {
        StorageError::Other(err)
    }
}

impl From<&str> for StorageError {
    fn from(err: &str) -> Self {
        StorageError::Other(err.to_string())
    }
}

/// Failures reported by the external collaborators: the claim-token registry
/// and the three asset-transfer protocols.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExternalError {
    #[error("insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: u128, available: u128 },

    #[error("insufficient allowance: need {needed}, have {available}")]
    InsufficientAllowance { needed: u128, available: u128 },

    #[error("caller is not owner nor approved")]
    NotOwnerOrApproved,

    #[error("token {0} does not exist")]
    NonexistentToken(u128),

    #[error("token {0} already minted")]
    AlreadyMinted(u128),

    #[error("transfer rejected: {0}")]
    Rejected(String),
}

/// Error taxonomy of the bundle lifecycle.
///
/// Every variant aborts the enclosing operation; nothing is retried or
/// recovered locally.
#[derive(Error, Debug)]
pub enum BundleError {
    /// Destination is the null address
    #[error("invalid recipient: null address")]
    InvalidRecipient,

    /// Attached native value does not match the manifest
    #[error("native value mismatch: manifest declares {expected}, received {received}")]
    NativeValueMismatch { expected: u128, received: u128 },

    /// Attached native value does not cover the whole batch
    #[error("values don't match: batch requires {expected:?}, received {received}")]
    ValuesDontMatch {
        /// `None` when the required total overflows
        expected: Option<u128>,
        received: u128,
    },

    /// Address and number sequences disagree with the header counts
    #[error("malformed manifest: {0}")]
    MalformedManifest(String),

    /// A fungible amount of zero at the given position of the fungible segment
    #[error("zero amount for fungible asset at index {index}")]
    ZeroAmountAsset { index: usize },

    /// Issuance would exceed the configured supply cap
    #[error("supply cap exceeded: cap {cap}, issued {issued}, requested {requested}")]
    SupplyCapExceeded { cap: u64, issued: u64, requested: u64 },

    /// No bundle exists for the identifier
    #[error("unknown identifier: {0}")]
    UnknownIdentifier(BundleId),

    /// Redemption attempted by someone other than the claim-token owner
    #[error("caller is not the owner of {0}")]
    NotOwner(BundleId),

    /// The outbound native-currency push failed
    #[error("native transfer of {amount} failed")]
    NativeTransferFailed { amount: u128 },

    /// A record already exists for the identifier
    #[error("duplicate identifier: {0}")]
    DuplicateIdentifier(BundleId),

    /// Vault construction was given an unusable configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An external collaborator refused a call
    #[error("external call failed: {0}")]
    Transfer(#[from] ExternalError),

    /// The custody backend failed
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl BundleError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        BundleError::MalformedManifest(reason.into())
    }
}

pub type BundleResult<T> = Result<T, BundleError>;
