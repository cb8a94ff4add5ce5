pub mod error;
pub mod events;
pub mod id;
pub mod manifest;
pub mod objects;

// Re-export the main types for convenience
pub use error::{BundleError, BundleResult, ExternalError, StorageError};
pub use events::BundleEvent;
pub use id::{Address, BundleId};
pub use manifest::{AssetManifest, FungibleAsset, MultiAsset, PackedManifest, UniqueAsset, HEADER_LEN};
pub use objects::BundleRecord;
