//! Capability identifiers and receive acknowledgements.
//!
//! The vault advertises which capabilities it implements and acknowledges
//! safe transfers made to it. Both use 4-byte identifiers understood by the
//! asset-transfer protocols.

use bundles_core::id::Address;

/// 4-byte identifier of a capability or of an acknowledgement
pub type Selector = [u8; 4];

/// Capabilities the vault can be queried for
pub mod interface {
    use super::Selector;

    /// The capability query itself
    pub const CAPABILITY_QUERY: Selector = [0x01, 0xff, 0xc9, 0xa7];
    /// The claim-token (non-fungible) registry
    pub const CLAIM_TOKEN: Selector = [0x80, 0xac, 0x58, 0xcd];
    /// Claim-token metadata extension
    pub const CLAIM_TOKEN_METADATA: Selector = [0x5b, 0x5e, 0x13, 0x9f];
    /// Receiver of unique items
    pub const UNIQUE_RECEIVER: Selector = [0x15, 0x0b, 0x7a, 0x02];
    /// Receiver of multi-quantity items
    pub const MULTI_RECEIVER: Selector = [0x4e, 0x23, 0x12, 0xe0];

    pub const SUPPORTED: [Selector; 5] = [
        CAPABILITY_QUERY,
        CLAIM_TOKEN,
        CLAIM_TOKEN_METADATA,
        UNIQUE_RECEIVER,
        MULTI_RECEIVER,
    ];
}

/// Returned to acknowledge a unique item
pub const UNIQUE_RECEIVED: Selector = [0x15, 0x0b, 0x7a, 0x02];
/// Returned to acknowledge a single multi-quantity transfer
pub const MULTI_RECEIVED: Selector = [0xf2, 0x3a, 0x6e, 0x61];
/// Returned to acknowledge a batched multi-quantity transfer
pub const MULTI_BATCH_RECEIVED: Selector = [0xbc, 0x19, 0x7c, 0x81];

pub fn supports_interface(id: Selector) -> bool {
    interface::SUPPORTED.contains(&id)
}

/// Accepts safe transfers of unique and multi-quantity items.
///
/// Implementations return the matching acknowledgement selector; anything
/// else makes the sending protocol refuse the transfer.
pub trait TokenReceiver {
    fn on_unique_received(
        &self,
        operator: &Address,
        from: &Address,
        item_id: u128,
        data: &[u8],
    ) -> Selector;

    fn on_multi_received(
        &self,
        operator: &Address,
        from: &Address,
        item_id: u128,
        amount: u128,
        data: &[u8],
    ) -> Selector;

    fn on_multi_batch_received(
        &self,
        operator: &Address,
        from: &Address,
        item_ids: &[u128],
        amounts: &[u128],
        data: &[u8],
    ) -> Selector;
}
