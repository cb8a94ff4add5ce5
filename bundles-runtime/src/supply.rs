use bundles_core::error::{BundleError, BundleResult};
use bundles_core::id::BundleId;

/// A contiguous block of freshly assigned identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    /// First identifier of the block
    pub first: BundleId,
    /// Number of identifiers in the block
    pub count: u64,
}

impl Reservation {
    /// Iterate the identifiers of the block in order
    pub fn ids(&self) -> impl Iterator<Item = BundleId> {
        let start = self.first.value();
        (start..start + self.count).map(BundleId)
    }

    pub fn contains(&self, id: BundleId) -> bool {
        id >= self.first && id.value() - self.first.value() < self.count
    }
}

/// Owns the issued counter and the optional cap on it.
///
/// The counter only moves forward through [`SupplyGuard::reserve`]; redemption
/// never decrements it, so identifiers are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupplyGuard {
    /// Maximum number of claim tokens ever issued, 0 means unlimited
    cap: u64,
    /// Number of claim tokens issued so far
    issued: u64,
}

impl SupplyGuard {
    pub fn new(cap: u64) -> Self {
        Self::resume(cap, 0)
    }

    /// Continue from a previously persisted counter
    pub fn resume(cap: u64, issued: u64) -> Self {
        Self { cap, issued }
    }

    pub fn cap(&self) -> u64 {
        self.cap
    }

    pub fn issued(&self) -> u64 {
        self.issued
    }

    pub fn is_capped(&self) -> bool {
        self.cap != 0
    }

    /// Identifiers still available, `None` when unlimited
    pub fn remaining(&self) -> Option<u64> {
        self.is_capped().then(|| self.cap.saturating_sub(self.issued))
    }

    /// Claim `count` identifiers in one step
    ///
    /// # Errors
    /// `SupplyCapExceeded` if a cap is set and `issued + count` exceeds it
    pub fn reserve(&mut self, count: u64) -> BundleResult<Reservation> {
        let exceeded = || BundleError::SupplyCapExceeded {
            cap: self.cap,
            issued: self.issued,
            requested: count,
        };

        let next = self.issued.checked_add(count).ok_or_else(exceeded)?;
        if self.is_capped() && next > self.cap {
            return Err(exceeded());
        }

        let reservation = Reservation {
            first: BundleId(self.issued),
            count,
        };
        self.issued = next;
        Ok(reservation)
    }

    /// Move the counter back to an earlier value while undoing a failed operation
    pub(crate) fn rewind(&mut self, issued: u64) {
        self.issued = issued;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserve_unlimited() {
        let mut guard = SupplyGuard::new(0);

        let first = guard.reserve(1).unwrap();
        assert_eq!(first.first, BundleId(0));

        let batch = guard.reserve(3).unwrap();
        assert_eq!(batch.ids().collect::<Vec<_>>(), vec![BundleId(1), BundleId(2), BundleId(3)]);
        assert_eq!(guard.issued(), 4);
        assert_eq!(guard.remaining(), None);
    }

    #[test]
    fn test_reserve_respects_cap() {
        let mut guard = SupplyGuard::new(2);
        guard.reserve(1).unwrap();
        guard.reserve(1).unwrap();

        let result = guard.reserve(1);
        assert!(matches!(
            result,
            Err(BundleError::SupplyCapExceeded { cap: 2, issued: 2, requested: 1 })
        ));
        assert_eq!(guard.issued(), 2);
    }

    #[test]
    fn test_batch_reservation_is_all_or_nothing() {
        let mut guard = SupplyGuard::new(5);
        guard.reserve(3).unwrap();

        assert!(guard.reserve(3).is_err());
        assert_eq!(guard.issued(), 3);
        assert_eq!(guard.remaining(), Some(2));

        // Exactly filling the cap is allowed
        let reservation = guard.reserve(2).unwrap();
        assert!(reservation.contains(BundleId(4)));
        assert!(!reservation.contains(BundleId(5)));
        assert_eq!(guard.remaining(), Some(0));
    }

    #[test]
    fn test_reserve_overflow() {
        let mut guard = SupplyGuard::resume(0, u64::MAX);
        assert!(guard.reserve(1).is_err());
        assert!(guard.reserve(0).is_ok());
    }

    #[test]
    fn test_rewind() {
        let mut guard = SupplyGuard::new(0);
        guard.reserve(2).unwrap();
        guard.rewind(1);
        assert_eq!(guard.reserve(1).unwrap().first, BundleId(1));
    }
}
