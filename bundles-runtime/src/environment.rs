//! Capabilities the vault consumes from the outside world.
//!
//! The claim-token registry and the asset-transfer protocols are external
//! collaborators. The vault only ever reaches them through an [`Environment`]
//! borrowed mutably for the whole of one operation.

use bundles_core::error::ExternalError;
use bundles_core::events::BundleEvent;
use bundles_core::id::{Address, BundleId};

/// Ownership registry of claim tokens
pub trait ClaimRegistry {
    /// Mint the claim token `id` to `owner`
    ///
    /// # Returns
    /// `ExternalError::AlreadyMinted` if the token exists
    fn mint(&mut self, owner: &Address, id: BundleId) -> Result<(), ExternalError>;

    /// Burn the claim token `id`
    ///
    /// # Returns
    /// `ExternalError::NonexistentToken` if the token does not exist
    fn burn(&mut self, id: BundleId) -> Result<(), ExternalError>;

    /// Current owner of the claim token `id`
    ///
    /// # Returns
    /// `ExternalError::NonexistentToken` if the token does not exist
    fn owner_of(&self, id: BundleId) -> Result<Address, ExternalError>;

    /// Check if the claim token `id` is minted and not burned
    fn exists(&self, id: BundleId) -> bool;
}

/// Fungible-token transfer protocol
pub trait FungibleTransfers {
    /// Move `amount` of `token` from `from` to `to`, spending the allowance
    /// `from` granted to `spender`
    fn transfer_from(
        &mut self,
        token: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), ExternalError>;

    /// Move `amount` of `token` held by `sender` to `to`
    fn transfer(
        &mut self,
        token: &Address,
        sender: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), ExternalError>;
}

/// Unique-item transfer protocol
pub trait UniqueTransfers {
    /// Safely move item `item_id` of `collection` from `from` to `to`.
    /// `operator` must be `from` or an approved operator of `from`.
    fn safe_transfer_item(
        &mut self,
        collection: &Address,
        operator: &Address,
        from: &Address,
        to: &Address,
        item_id: u128,
    ) -> Result<(), ExternalError>;
}

/// Multi-quantity transfer protocol
pub trait MultiTransfers {
    /// Safely move `amount` units of item `item_id` of `collection`.
    /// `operator` must be `from` or an approved operator of `from`.
    #[allow(clippy::too_many_arguments)]
    fn safe_transfer_quantity(
        &mut self,
        collection: &Address,
        operator: &Address,
        from: &Address,
        to: &Address,
        item_id: u128,
        amount: u128,
        data: &[u8],
    ) -> Result<(), ExternalError>;
}

/// Native currency movements
pub trait NativeCurrency {
    /// Take the value attached to a call from `from` into `to`
    fn collect_value(&mut self, from: &Address, to: &Address, amount: u128)
        -> Result<(), ExternalError>;

    /// Push value from `from` to `to`, reporting success
    fn send_value(&mut self, from: &Address, to: &Address, amount: u128) -> bool;
}

/// Sink for lifecycle events
pub trait EventSink {
    fn emit(&mut self, event: BundleEvent);
}

/// All-or-nothing execution support.
///
/// Reverting to a checkpoint undoes every change made since it was taken,
/// including changes made by nested operations.
pub trait Transactional {
    type Checkpoint;

    /// Capture the current state
    fn checkpoint(&mut self) -> Self::Checkpoint;

    /// Discard every change made since `checkpoint` was taken
    fn revert_to(&mut self, checkpoint: Self::Checkpoint);
}

/// The three asset-transfer protocols plus native currency
pub trait AssetTransfers: FungibleTransfers + UniqueTransfers + MultiTransfers + NativeCurrency {}

impl<T> AssetTransfers for T where T: FungibleTransfers + UniqueTransfers + MultiTransfers + NativeCurrency {}

/// Everything a vault operation may touch outside the vault itself
pub trait Environment: ClaimRegistry + AssetTransfers + EventSink + Transactional {}

impl<T> Environment for T where T: ClaimRegistry + AssetTransfers + EventSink + Transactional {}
