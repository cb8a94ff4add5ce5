use bundles_core::error::{BundleError, BundleResult, ExternalError};
use bundles_core::events::BundleEvent;
use bundles_core::id::{Address, BundleId};
use bundles_core::manifest::{AssetManifest, PackedManifest};
use bundles_core::objects::BundleRecord;
use bundles_custody::{CustodyLedger, CustodyStorage};
use log::{debug, error, info, warn};
use parking_lot::{Mutex, MutexGuard, ReentrantMutex};

use crate::config::VaultConfig;
use crate::environment::{ClaimRegistry, Environment};
use crate::gateway::AssetTransferGateway;
use crate::journal::{revert_effects, Effect, Journal};
use crate::receiver::{self, Selector, TokenReceiver};
use crate::supply::{Reservation, SupplyGuard};

#[derive(Debug)]
struct VaultState {
    supply: SupplyGuard,
    journal: Journal,
}

/// Lifecycle controller of asset bundles.
///
/// Issuance pulls a manifest's assets into custody and mints a claim token;
/// redemption burns the token and releases the assets to its owner. Each
/// operation is all-or-nothing: on failure the vault undoes its own custody
/// and supply changes and reverts the environment to where the operation
/// started.
///
/// Operations from different threads run one at a time. The thread running
/// an operation may enter the vault again, so code reached through an asset
/// transfer can call back into it. Redemption burns the claim token and
/// removes the custody record before any asset leaves custody, so such a call
/// finds nothing left to redeem.
#[derive(Debug)]
pub struct BundleVault<S: CustodyStorage> {
    config: VaultConfig,
    gateway: AssetTransferGateway,
    ledger: CustodyLedger<S>,
    /// Held by the thread whose operation is in flight
    operations: ReentrantMutex<()>,
    /// Never held while the environment runs
    state: Mutex<VaultState>,
}

impl<S: CustodyStorage> BundleVault<S> {
    /// Create a vault over `storage`, resuming the issued counter it holds
    pub fn new(config: VaultConfig, storage: S) -> BundleResult<Self> {
        config.validate()?;

        let issued = storage.issued_count()?;
        let supply = SupplyGuard::resume(config.supply_cap, issued);
        info!(
            "vault {} ready: {} issued, cap {}",
            config.custody_address, issued, config.supply_cap
        );

        Ok(Self {
            gateway: AssetTransferGateway::new(config.custody_address),
            ledger: CustodyLedger::new(storage),
            operations: ReentrantMutex::new(()),
            state: Mutex::new(VaultState {
                supply,
                journal: Journal::new(),
            }),
            config,
        })
    }

    fn state(&self) -> MutexGuard<'_, VaultState> {
        self.state.lock()
    }

    /// Run `body` as one unit of work, undoing everything it did if it fails
    fn run<E, T, F>(&self, env: &mut E, operation: &str, body: F) -> BundleResult<T>
    where
        E: Environment,
        F: FnOnce(&mut E) -> BundleResult<T>,
    {
        let _operation = self.operations.lock();
        let checkpoint = env.checkpoint();
        let mark = self.state().journal.begin();

        match body(env) {
            Ok(value) => {
                self.state().journal.finish(mark);
                Ok(value)
            }
            Err(err) => {
                warn!("{} rolled back: {}", operation, err);

                let mut state = self.state();
                let effects = state.journal.unwind(mark);
                let failures = revert_effects(&effects, &self.ledger, &mut state.supply);
                drop(state);

                for failure in &failures {
                    error!("incomplete rollback of {}: {}", operation, failure);
                }

                env.revert_to(checkpoint);
                Err(err)
            }
        }
    }

    fn reserve(&self, count: u64) -> BundleResult<Reservation> {
        let mut state = self.state();
        let issued_before = state.supply.issued();
        let reservation = state.supply.reserve(count)?;
        let issued_after = state.supply.issued();
        state.journal.record(Effect::Supply {
            issued_before,
            issued_after,
        });

        self.ledger.storage().set_issued_count(issued_after)?;
        Ok(reservation)
    }

    fn store_record(&self, id: BundleId, manifest: AssetManifest) -> BundleResult<()> {
        let record = BundleRecord::new(id, manifest.clone());
        self.ledger.store(id, manifest)?;
        self.state().journal.record(Effect::Custody {
            id,
            before_image: None,
            after_image: Some(record),
        });
        Ok(())
    }

    fn take_record(&self, id: BundleId) -> BundleResult<AssetManifest> {
        let manifest = self.ledger.take(id)?;
        self.state().journal.record(Effect::Custody {
            id,
            before_image: Some(BundleRecord::new(id, manifest.clone())),
            after_image: None,
        });
        Ok(manifest)
    }

    /// Decode, deposit, store and mint one bundle at an already reserved identifier
    #[allow(clippy::too_many_arguments)]
    fn issue_one<E: Environment>(
        &self,
        env: &mut E,
        payer: &Address,
        recipient: &Address,
        id: BundleId,
        addresses: &[Address],
        numbers: &[u128],
        native_value_received: u128,
    ) -> BundleResult<()> {
        let manifest = AssetManifest::decode(addresses, numbers)?;
        self.gateway
            .deposit(env, payer, &manifest, native_value_received)?;

        let packed = manifest.encode();
        self.store_record(id, manifest)?;
        env.mint(recipient, id)?;
        env.emit(BundleEvent::Issued {
            recipient: *recipient,
            id,
            manifest: packed,
        });
        Ok(())
    }

    /// Deposit the assets described by `addresses`/`numbers` from `caller`
    /// and mint a claim token for them to `recipient`
    ///
    /// # Parameters
    /// * `value` - native currency attached to the call by `caller`
    ///
    /// # Returns
    /// The identifier of the new claim token
    pub fn issue<E: Environment>(
        &self,
        env: &mut E,
        caller: &Address,
        recipient: &Address,
        addresses: &[Address],
        numbers: &[u128],
        value: u128,
    ) -> BundleResult<BundleId> {
        self.run(env, "issue", |env| {
            if recipient.is_null() {
                return Err(BundleError::InvalidRecipient);
            }

            let id = self.reserve(1)?.first;
            self.issue_one(env, caller, recipient, id, addresses, numbers, value)?;

            info!("issued {} to {}", id, recipient);
            Ok(id)
        })
    }

    /// Issue `bundle_count` bundles sharing `addresses`, one per entry of
    /// `per_bundle_numbers`, all to `recipient`
    ///
    /// The attached `value` must equal the first bundle's native amount times
    /// `bundle_count`, and every bundle is credited that first amount.
    ///
    /// # Returns
    /// The block of identifiers minted, in the order of `per_bundle_numbers`
    #[allow(clippy::too_many_arguments)]
    pub fn batch_issue<E: Environment>(
        &self,
        env: &mut E,
        caller: &Address,
        recipient: &Address,
        addresses: &[Address],
        per_bundle_numbers: &[Vec<u128>],
        bundle_count: u64,
        value: u128,
    ) -> BundleResult<Reservation> {
        self.run(env, "batch issue", |env| {
            if recipient.is_null() {
                return Err(BundleError::InvalidRecipient);
            }
            if bundle_count == 0 || per_bundle_numbers.len() as u64 != bundle_count {
                return Err(BundleError::malformed(format!(
                    "batch of {} bundles carries {} number sequences",
                    bundle_count,
                    per_bundle_numbers.len()
                )));
            }

            let native_per_bundle = per_bundle_numbers
                .first()
                .and_then(|numbers| numbers.first())
                .copied()
                .ok_or_else(|| BundleError::malformed("empty number sequence"))?;

            let expected = native_per_bundle.checked_mul(u128::from(bundle_count));
            if expected != Some(value) {
                return Err(BundleError::ValuesDontMatch {
                    expected,
                    received: value,
                });
            }

            if per_bundle_numbers
                .iter()
                .any(|numbers| numbers.first() != Some(&native_per_bundle))
            {
                warn!(
                    "batch declares differing native amounts, each bundle is credited {}",
                    native_per_bundle
                );
            }

            let reservation = self.reserve(bundle_count)?;
            for (id, numbers) in reservation.ids().zip(per_bundle_numbers) {
                self.issue_one(env, caller, recipient, id, addresses, numbers, native_per_bundle)?;
            }

            info!(
                "batch issued {} bundles from {} to {}",
                bundle_count, reservation.first, recipient
            );
            Ok(reservation)
        })
    }

    /// Burn claim token `id` owned by `caller` and release its assets to `caller`
    pub fn redeem<E: Environment>(&self, env: &mut E, caller: &Address, id: BundleId) -> BundleResult<()> {
        self.run(env, "redeem", |env| {
            let owner = env.owner_of(id).map_err(|err| match err {
                ExternalError::NonexistentToken(_) => BundleError::UnknownIdentifier(id),
                other => other.into(),
            })?;
            if owner != *caller {
                return Err(BundleError::NotOwner(id));
            }

            // Close ownership and custody before any asset leaves
            env.burn(id)?;
            let manifest = self.take_record(id)?;
            env.emit(BundleEvent::Redeemed {
                id,
                redeemer: *caller,
                manifest: manifest.encode(),
            });

            self.gateway.withdraw(env, caller, &manifest)?;

            info!("redeemed {} by {}", id, caller);
            Ok(())
        })
    }

    /// Number of claim tokens ever issued, redeemed ones included
    pub fn total_issued(&self) -> u64 {
        self.state().supply.issued()
    }

    pub fn supply_cap(&self) -> u64 {
        self.config.supply_cap
    }

    /// Packed manifest of a live bundle
    pub fn manifest_of(&self, id: BundleId) -> BundleResult<PackedManifest> {
        Ok(self.ledger.get(id)?.encode())
    }

    /// Check if a custody record exists for `id`
    pub fn is_live(&self, id: BundleId) -> BundleResult<bool> {
        self.ledger.contains(id)
    }

    /// Check if the claim token `id` exists in the registry
    pub fn exists<R: ClaimRegistry + ?Sized>(&self, registry: &R, id: BundleId) -> bool {
        registry.exists(id)
    }

    /// Identifiers of all bundles held in custody, in order
    pub fn live_bundles(&self) -> BundleResult<Vec<BundleId>> {
        Ok(self
            .ledger
            .records()?
            .into_iter()
            .map(|record| record.id())
            .collect())
    }

    /// Metadata URI of a claim token, the same for every identifier
    pub fn metadata_uri(&self, _id: BundleId) -> &str {
        &self.config.metadata_uri
    }

    pub fn supports_interface(&self, id: Selector) -> bool {
        receiver::supports_interface(id)
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub fn custody_address(&self) -> &Address {
        self.gateway.custody()
    }

    pub fn ledger(&self) -> &CustodyLedger<S> {
        &self.ledger
    }
}

impl<S: CustodyStorage> TokenReceiver for BundleVault<S> {
    fn on_unique_received(
        &self,
        operator: &Address,
        from: &Address,
        item_id: u128,
        _data: &[u8],
    ) -> Selector {
        debug!("received item {} from {} via {}", item_id, from, operator);
        receiver::UNIQUE_RECEIVED
    }

    fn on_multi_received(
        &self,
        operator: &Address,
        from: &Address,
        item_id: u128,
        amount: u128,
        _data: &[u8],
    ) -> Selector {
        debug!("received {} x item {} from {} via {}", amount, item_id, from, operator);
        receiver::MULTI_RECEIVED
    }

    fn on_multi_batch_received(
        &self,
        operator: &Address,
        from: &Address,
        item_ids: &[u128],
        _amounts: &[u128],
        _data: &[u8],
    ) -> Selector {
        debug!("received {} items from {} via {}", item_ids.len(), from, operator);
        receiver::MULTI_BATCH_RECEIVED
    }
}
