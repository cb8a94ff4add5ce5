use crate::id::{Address, BundleId};
use crate::manifest::PackedManifest;
use serde::{Deserialize, Serialize};

/// Observable side effects of the bundle lifecycle, kept for audit and indexing.
///
/// Events are only recorded by operations that succeed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BundleEvent {
    /// A bundle was deposited and its claim token minted
    Issued {
        recipient: Address,
        id: BundleId,
        manifest: PackedManifest,
    },

    /// A claim token was burned and its bundle released
    Redeemed {
        id: BundleId,
        redeemer: Address,
        manifest: PackedManifest,
    },
}

impl BundleEvent {
    pub fn id(&self) -> BundleId {
        match self {
            BundleEvent::Issued { id, .. } | BundleEvent::Redeemed { id, .. } => *id,
        }
    }

    pub fn is_issued(&self) -> bool {
        matches!(self, BundleEvent::Issued { .. })
    }

    pub fn is_redeemed(&self) -> bool {
        matches!(self, BundleEvent::Redeemed { .. })
    }
}
