use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use bundles_core::error::ExternalError;
use bundles_core::events::BundleEvent;
use bundles_core::id::{Address, BundleId};

use crate::environment::{
    ClaimRegistry, EventSink, FungibleTransfers, MultiTransfers, NativeCurrency, Transactional,
    UniqueTransfers,
};
use crate::receiver::{TokenReceiver, MULTI_RECEIVED, UNIQUE_RECEIVED};

/// Code run when an asset is delivered to an address.
///
/// Stands in for the receive callbacks of untrusted contracts; the hook gets
/// the whole environment and may call back into a vault.
pub type ReceiverHook = Box<dyn FnMut(&mut MockEnvironment)>;

/// A call made against the mock environment, in the order it was made
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CollectValue { from: Address, amount: u128 },
    TransferFrom { token: Address, from: Address, to: Address, amount: u128 },
    Transfer { token: Address, to: Address, amount: u128 },
    TransferItem { collection: Address, from: Address, to: Address, item_id: u128 },
    TransferQuantity { collection: Address, from: Address, to: Address, item_id: u128, amount: u128 },
    SendValue { to: Address, amount: u128 },
    Mint { owner: Address, id: BundleId },
    Burn { id: BundleId },
}

/// Everything that is rolled back by `revert_to`
#[derive(Debug, Clone, Default)]
pub struct WorldState {
    native: HashMap<Address, u128>,
    // (token, holder)
    fungible: HashMap<(Address, Address), u128>,
    // (token, owner, spender)
    allowances: HashMap<(Address, Address, Address), u128>,
    // (collection, item) -> owner
    unique_owners: HashMap<(Address, u128), Address>,
    // (collection, owner, operator)
    unique_operators: HashSet<(Address, Address, Address)>,
    // (collection, item, holder)
    multi: HashMap<(Address, u128, Address), u128>,
    // (collection, owner, operator)
    multi_operators: HashSet<(Address, Address, Address)>,
    claims: BTreeMap<BundleId, Address>,
    events: Vec<BundleEvent>,
}

/// In-memory world implementing every capability a vault consumes.
///
/// Used by tests and by embedders who want to exercise a vault without a
/// real ledger behind it.
#[derive(Default)]
pub struct MockEnvironment {
    world: WorldState,
    /// Calls made so far, including calls of operations that were rolled back
    trace: Vec<Call>,
    /// Addresses that refuse native value
    rejects_native: HashSet<Address>,
    hooks: HashMap<Address, ReceiverHook>,
    /// Addresses whose safe transfers must be acknowledged
    receivers: HashMap<Address, Rc<dyn TokenReceiver>>,
}

impl fmt::Debug for MockEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockEnvironment")
            .field("world", &self.world)
            .field("trace", &self.trace)
            .field("rejects_native", &self.rejects_native)
            .field("hooks", &self.hooks.keys().collect::<Vec<_>>())
            .field("receivers", &self.receivers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl MockEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- Setup ----

    pub fn mint_native(&mut self, holder: &Address, amount: u128) {
        *self.world.native.entry(*holder).or_default() += amount;
    }

    pub fn mint_fungible(&mut self, token: &Address, holder: &Address, amount: u128) {
        *self.world.fungible.entry((*token, *holder)).or_default() += amount;
    }

    pub fn approve(&mut self, token: &Address, owner: &Address, spender: &Address, amount: u128) {
        self.world
            .allowances
            .insert((*token, *owner, *spender), amount);
    }

    pub fn mint_unique(&mut self, collection: &Address, owner: &Address, item_id: u128) {
        self.world
            .unique_owners
            .insert((*collection, item_id), *owner);
    }

    pub fn set_unique_operator(
        &mut self,
        collection: &Address,
        owner: &Address,
        operator: &Address,
        approved: bool,
    ) {
        let key = (*collection, *owner, *operator);
        if approved {
            self.world.unique_operators.insert(key);
        } else {
            self.world.unique_operators.remove(&key);
        }
    }

    pub fn mint_multi(&mut self, collection: &Address, holder: &Address, item_id: u128, amount: u128) {
        *self
            .world
            .multi
            .entry((*collection, item_id, *holder))
            .or_default() += amount;
    }

    pub fn set_multi_operator(
        &mut self,
        collection: &Address,
        owner: &Address,
        operator: &Address,
        approved: bool,
    ) {
        let key = (*collection, *owner, *operator);
        if approved {
            self.world.multi_operators.insert(key);
        } else {
            self.world.multi_operators.remove(&key);
        }
    }

    /// Make `address` refuse every native value push
    pub fn reject_native(&mut self, address: &Address) {
        self.rejects_native.insert(*address);
    }

    /// Run `hook` whenever an item, a quantity or native value is delivered to `address`
    pub fn on_receive(&mut self, address: &Address, hook: ReceiverHook) {
        self.hooks.insert(*address, hook);
    }

    /// Route safe transfers to `address` through `receiver`, which must
    /// acknowledge each one for the transfer to go through
    pub fn register_receiver(&mut self, address: &Address, receiver: Rc<dyn TokenReceiver>) {
        self.receivers.insert(*address, receiver);
    }

    /// Move a claim token between owners, as a secondary market would
    pub fn transfer_claim(
        &mut self,
        from: &Address,
        to: &Address,
        id: BundleId,
    ) -> Result<(), ExternalError> {
        let owner = self
            .world
            .claims
            .get_mut(&id)
            .ok_or(ExternalError::NonexistentToken(id.value() as u128))?;
        if owner != from {
            return Err(ExternalError::NotOwnerOrApproved);
        }
        *owner = *to;
        Ok(())
    }

    // ---- Inspection ----

    pub fn native_balance(&self, holder: &Address) -> u128 {
        self.world.native.get(holder).copied().unwrap_or_default()
    }

    pub fn fungible_balance(&self, token: &Address, holder: &Address) -> u128 {
        self.world
            .fungible
            .get(&(*token, *holder))
            .copied()
            .unwrap_or_default()
    }

    pub fn allowance(&self, token: &Address, owner: &Address, spender: &Address) -> u128 {
        self.world
            .allowances
            .get(&(*token, *owner, *spender))
            .copied()
            .unwrap_or_default()
    }

    pub fn unique_owner(&self, collection: &Address, item_id: u128) -> Option<Address> {
        self.world
            .unique_owners
            .get(&(*collection, item_id))
            .copied()
    }

    pub fn multi_balance(&self, collection: &Address, holder: &Address, item_id: u128) -> u128 {
        self.world
            .multi
            .get(&(*collection, item_id, *holder))
            .copied()
            .unwrap_or_default()
    }

    pub fn events(&self) -> &[BundleEvent] {
        &self.world.events
    }

    pub fn trace(&self) -> &[Call] {
        &self.trace
    }

    pub fn clear_trace(&mut self) {
        self.trace.clear();
    }

    /// Run the receiver hook of `to`, if any. The hook is detached while it
    /// runs so deliveries it triggers to the same address do not recurse.
    fn notify(&mut self, to: &Address) {
        if let Some(mut hook) = self.hooks.remove(to) {
            hook(self);
            self.hooks.entry(*to).or_insert(hook);
        }
    }

    fn acknowledge_unique(
        &self,
        operator: &Address,
        from: &Address,
        to: &Address,
        item_id: u128,
    ) -> Result<(), ExternalError> {
        match self.receivers.get(to) {
            Some(receiver) if receiver.on_unique_received(operator, from, item_id, &[]) != UNIQUE_RECEIVED => {
                Err(ExternalError::Rejected(format!("{} refused item {}", to, item_id)))
            }
            _ => Ok(()),
        }
    }

    fn acknowledge_multi(
        &self,
        operator: &Address,
        from: &Address,
        to: &Address,
        item_id: u128,
        amount: u128,
        data: &[u8],
    ) -> Result<(), ExternalError> {
        match self.receivers.get(to) {
            Some(receiver)
                if receiver.on_multi_received(operator, from, item_id, amount, data) != MULTI_RECEIVED =>
            {
                Err(ExternalError::Rejected(format!(
                    "{} refused {} x item {}",
                    to, amount, item_id
                )))
            }
            _ => Ok(()),
        }
    }

    fn debit(balance: &mut u128, amount: u128) -> Result<(), ExternalError> {
        if *balance < amount {
            return Err(ExternalError::InsufficientBalance {
                needed: amount,
                available: *balance,
            });
        }
        *balance -= amount;
        Ok(())
    }
}

impl ClaimRegistry for MockEnvironment {
    fn mint(&mut self, owner: &Address, id: BundleId) -> Result<(), ExternalError> {
        self.trace.push(Call::Mint { owner: *owner, id });
        if owner.is_null() {
            return Err(ExternalError::Rejected("mint to the null address".to_string()));
        }
        if self.world.claims.contains_key(&id) {
            return Err(ExternalError::AlreadyMinted(id.value() as u128));
        }
        self.world.claims.insert(id, *owner);
        Ok(())
    }

    fn burn(&mut self, id: BundleId) -> Result<(), ExternalError> {
        self.trace.push(Call::Burn { id });
        self.world
            .claims
            .remove(&id)
            .map(|_| ())
            .ok_or(ExternalError::NonexistentToken(id.value() as u128))
    }

    fn owner_of(&self, id: BundleId) -> Result<Address, ExternalError> {
        self.world
            .claims
            .get(&id)
            .copied()
            .ok_or(ExternalError::NonexistentToken(id.value() as u128))
    }

    fn exists(&self, id: BundleId) -> bool {
        self.world.claims.contains_key(&id)
    }
}

impl FungibleTransfers for MockEnvironment {
    fn transfer_from(
        &mut self,
        token: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), ExternalError> {
        self.trace.push(Call::TransferFrom {
            token: *token,
            from: *from,
            to: *to,
            amount,
        });

        if spender != from {
            let allowance = self
                .world
                .allowances
                .entry((*token, *from, *spender))
                .or_default();
            if *allowance < amount {
                return Err(ExternalError::InsufficientAllowance {
                    needed: amount,
                    available: *allowance,
                });
            }
            *allowance -= amount;
        }

        let balance = self.world.fungible.entry((*token, *from)).or_default();
        Self::debit(balance, amount)?;
        *self.world.fungible.entry((*token, *to)).or_default() += amount;
        Ok(())
    }

    fn transfer(
        &mut self,
        token: &Address,
        sender: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), ExternalError> {
        self.trace.push(Call::Transfer {
            token: *token,
            to: *to,
            amount,
        });

        let balance = self.world.fungible.entry((*token, *sender)).or_default();
        Self::debit(balance, amount)?;
        *self.world.fungible.entry((*token, *to)).or_default() += amount;
        Ok(())
    }
}

impl UniqueTransfers for MockEnvironment {
    fn safe_transfer_item(
        &mut self,
        collection: &Address,
        operator: &Address,
        from: &Address,
        to: &Address,
        item_id: u128,
    ) -> Result<(), ExternalError> {
        self.trace.push(Call::TransferItem {
            collection: *collection,
            from: *from,
            to: *to,
            item_id,
        });

        let owner = self
            .world
            .unique_owners
            .get(&(*collection, item_id))
            .copied()
            .ok_or(ExternalError::NonexistentToken(item_id))?;
        if owner != *from {
            return Err(ExternalError::NotOwnerOrApproved);
        }
        if operator != from
            && !self
                .world
                .unique_operators
                .contains(&(*collection, *from, *operator))
        {
            return Err(ExternalError::NotOwnerOrApproved);
        }
        if to.is_null() {
            return Err(ExternalError::Rejected("transfer to the null address".to_string()));
        }
        self.acknowledge_unique(operator, from, to, item_id)?;

        self.world.unique_owners.insert((*collection, item_id), *to);
        self.notify(to);
        Ok(())
    }
}

impl MultiTransfers for MockEnvironment {
    fn safe_transfer_quantity(
        &mut self,
        collection: &Address,
        operator: &Address,
        from: &Address,
        to: &Address,
        item_id: u128,
        amount: u128,
        data: &[u8],
    ) -> Result<(), ExternalError> {
        self.trace.push(Call::TransferQuantity {
            collection: *collection,
            from: *from,
            to: *to,
            item_id,
            amount,
        });

        if operator != from
            && !self
                .world
                .multi_operators
                .contains(&(*collection, *from, *operator))
        {
            return Err(ExternalError::NotOwnerOrApproved);
        }
        if to.is_null() {
            return Err(ExternalError::Rejected("transfer to the null address".to_string()));
        }
        let available = self.multi_balance(collection, from, item_id);
        if available < amount {
            return Err(ExternalError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        self.acknowledge_multi(operator, from, to, item_id, amount, data)?;

        let balance = self
            .world
            .multi
            .entry((*collection, item_id, *from))
            .or_default();
        Self::debit(balance, amount)?;
        *self
            .world
            .multi
            .entry((*collection, item_id, *to))
            .or_default() += amount;
        self.notify(to);
        Ok(())
    }
}

impl NativeCurrency for MockEnvironment {
    fn collect_value(
        &mut self,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), ExternalError> {
        self.trace.push(Call::CollectValue {
            from: *from,
            amount,
        });

        let balance = self.world.native.entry(*from).or_default();
        Self::debit(balance, amount)?;
        *self.world.native.entry(*to).or_default() += amount;
        Ok(())
    }

    fn send_value(&mut self, from: &Address, to: &Address, amount: u128) -> bool {
        self.trace.push(Call::SendValue { to: *to, amount });

        if self.rejects_native.contains(to) {
            return false;
        }
        let balance = self.world.native.entry(*from).or_default();
        if Self::debit(balance, amount).is_err() {
            return false;
        }
        *self.world.native.entry(*to).or_default() += amount;
        self.notify(to);
        true
    }
}

impl EventSink for MockEnvironment {
    fn emit(&mut self, event: BundleEvent) {
        self.world.events.push(event);
    }
}

impl Transactional for MockEnvironment {
    type Checkpoint = WorldState;

    fn checkpoint(&mut self) -> WorldState {
        self.world.clone()
    }

    fn revert_to(&mut self, checkpoint: WorldState) {
        self.world = checkpoint;
    }
}
