use crate::id::BundleId;
use crate::manifest::{AssetManifest, PackedManifest};
use serde::{Deserialize, Serialize};

/// Custody record of one live bundle.
///
/// A record exists exactly while the claim token with the same identifier
/// is unburned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleRecord {
    /// Identifier shared with the claim token
    pub id: BundleId,

    /// Assets held in custody for this bundle
    pub manifest: AssetManifest,
}

impl BundleRecord {
    pub fn new(id: BundleId, manifest: AssetManifest) -> Self {
        Self { id, manifest }
    }

    /// Get the record identifier
    pub fn id(&self) -> BundleId {
        self.id
    }

    /// The manifest in its packed form, as reported to callers
    pub fn packed(&self) -> PackedManifest {
        self.manifest.encode()
    }
}
