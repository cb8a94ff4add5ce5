use bundles_core::error::BundleError;
use bundles_core::id::BundleId;
use bundles_core::objects::BundleRecord;
use bundles_custody::{CustodyLedger, CustodyStorage};
use log::debug;

use crate::supply::SupplyGuard;

/// Before and after state of one vault-side change
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Effect {
    Custody {
        id: BundleId,
        /// The record before the change (None if it was created)
        before_image: Option<BundleRecord>,
        /// The record after the change (None if it was removed)
        after_image: Option<BundleRecord>,
    },
    Supply {
        issued_before: u64,
        issued_after: u64,
    },
}

/// Position in the journal where an operation started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Mark(usize);

/// Vault-side effects of the operations currently in flight.
///
/// Operations nest when a receiver calls back into the vault. Effects of a
/// nested operation that succeeded stay in the journal until the outermost
/// operation finishes, since a later failure must undo them too.
#[derive(Debug, Default)]
pub(crate) struct Journal {
    effects: Vec<Effect>,
    depth: usize,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a frame for a new operation
    pub fn begin(&mut self) -> Mark {
        self.depth += 1;
        Mark(self.effects.len())
    }

    pub fn record(&mut self, effect: Effect) {
        if self.depth > 0 {
            self.effects.push(effect);
        }
    }

    /// Close a frame that succeeded
    pub fn finish(&mut self, _mark: Mark) {
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            self.effects.clear();
        }
    }

    /// Close a frame that failed, handing back its effects newest first
    pub fn unwind(&mut self, mark: Mark) -> Vec<Effect> {
        self.depth = self.depth.saturating_sub(1);
        let start = mark.0.min(self.effects.len());
        let mut undone: Vec<Effect> = self.effects.drain(start..).collect();
        undone.reverse();
        undone
    }

    #[cfg(test)]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.effects.len()
    }
}

/// Restore the vault-side state captured in `effects`, which must be newest first.
///
/// Every effect is attempted even when an earlier one fails.
///
/// # Returns
/// The failures met along the way, empty when the state was fully restored
pub(crate) fn revert_effects<S: CustodyStorage>(
    effects: &[Effect],
    ledger: &CustodyLedger<S>,
    supply: &mut SupplyGuard,
) -> Vec<BundleError> {
    let mut failures = Vec::new();

    for effect in effects {
        match effect {
            Effect::Custody {
                id,
                before_image,
                after_image,
            } => {
                debug!("reverting custody change of {}", id);
                if after_image.is_some() {
                    if let Err(e) = ledger.discard(*id) {
                        failures.push(e);
                    }
                }
                if let Some(record) = before_image {
                    if let Err(e) = ledger.reinstate(record) {
                        failures.push(e);
                    }
                }
            }
            Effect::Supply {
                issued_before,
                issued_after,
            } => {
                debug!("reverting supply counter {} -> {}", issued_after, issued_before);
                supply.rewind(*issued_before);
                if let Err(e) = ledger.storage().set_issued_count(*issued_before) {
                    failures.push(e.into());
                }
            }
        }
    }

    failures
}
