use bundles_core::error::{BundleError, BundleResult};
use bundles_core::id::Address;
use bundles_core::manifest::AssetManifest;
use log::debug;

use crate::environment::AssetTransfers;

/// Moves bundle assets into and out of custody.
///
/// Both directions walk the manifest in the same fixed order: fungible
/// tokens, then unique items, then multi-quantity items, each in list order.
/// Any refused transfer aborts the call; undoing the transfers that already
/// happened is left to the enclosing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetTransferGateway {
    /// Address holding assets in custody, the vault itself
    custody: Address,
}

impl AssetTransferGateway {
    pub fn new(custody: Address) -> Self {
        Self { custody }
    }

    pub fn custody(&self) -> &Address {
        &self.custody
    }

    /// Pull every asset of `manifest` from `payer` into custody
    ///
    /// # Errors
    /// * `NativeValueMismatch` - `native_value_received` differs from the manifest
    /// * `Transfer` - one of the protocols refused a transfer
    pub fn deposit<E: AssetTransfers + ?Sized>(
        &self,
        env: &mut E,
        payer: &Address,
        manifest: &AssetManifest,
        native_value_received: u128,
    ) -> BundleResult<()> {
        if native_value_received != manifest.native_amount {
            return Err(BundleError::NativeValueMismatch {
                expected: manifest.native_amount,
                received: native_value_received,
            });
        }

        if native_value_received > 0 {
            env.collect_value(payer, &self.custody, native_value_received)?;
        }

        for asset in &manifest.fungible {
            debug!("deposit {} of {} from {}", asset.amount, asset.token, payer);
            env.transfer_from(&asset.token, &self.custody, payer, &self.custody, asset.amount)?;
        }

        for asset in &manifest.unique {
            debug!("deposit item {} of {} from {}", asset.item_id, asset.collection, payer);
            env.safe_transfer_item(
                &asset.collection,
                &self.custody,
                payer,
                &self.custody,
                asset.item_id,
            )?;
        }

        for asset in &manifest.multi {
            debug!(
                "deposit {} x item {} of {} from {}",
                asset.amount, asset.item_id, asset.collection, payer
            );
            env.safe_transfer_quantity(
                &asset.collection,
                &self.custody,
                payer,
                &self.custody,
                asset.item_id,
                asset.amount,
                &[],
            )?;
        }

        Ok(())
    }

    /// Push every asset of `manifest` from custody to `payee`, native currency last
    ///
    /// # Errors
    /// * `Transfer` - one of the protocols refused a transfer
    /// * `NativeTransferFailed` - the native push did not succeed
    pub fn withdraw<E: AssetTransfers + ?Sized>(
        &self,
        env: &mut E,
        payee: &Address,
        manifest: &AssetManifest,
    ) -> BundleResult<()> {
        for asset in &manifest.fungible {
            debug!("withdraw {} of {} to {}", asset.amount, asset.token, payee);
            env.transfer(&asset.token, &self.custody, payee, asset.amount)?;
        }

        for asset in &manifest.unique {
            debug!("withdraw item {} of {} to {}", asset.item_id, asset.collection, payee);
            env.safe_transfer_item(
                &asset.collection,
                &self.custody,
                &self.custody,
                payee,
                asset.item_id,
            )?;
        }

        for asset in &manifest.multi {
            debug!(
                "withdraw {} x item {} of {} to {}",
                asset.amount, asset.item_id, asset.collection, payee
            );
            env.safe_transfer_quantity(
                &asset.collection,
                &self.custody,
                &self.custody,
                payee,
                asset.item_id,
                asset.amount,
                &[],
            )?;
        }

        if manifest.native_amount > 0 && !env.send_value(&self.custody, payee, manifest.native_amount)
        {
            return Err(BundleError::NativeTransferFailed {
                amount: manifest.native_amount,
            });
        }

        Ok(())
    }
}
