use serde::{Deserialize, Serialize};

use crate::types::{Address, LabelId, Timestamp};

/// One registered name: owner plus absolute expiration.
///
/// Expiration is the source of truth for liveness. A record whose
/// `expiration` has passed is dead immediately, whether or not storage has
/// been swept; every read path must go through [`NameRecord::is_available`]
/// rather than trusting stored fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRecord {
    pub label_id: LabelId,
    pub owner: Address,
    /// Absolute expiration timestamp (seconds). `0` means fully cleared.
    pub expiration: Timestamp,
}

impl NameRecord {
    pub fn new(label_id: LabelId, owner: Address, expiration: Timestamp) -> Self {
        Self { label_id, owner, expiration }
    }

    /// A record is available iff it has no owner or its time has passed.
    /// Derived predicate, never a stored flag.
    pub fn is_available(&self, now: Timestamp) -> bool {
        self.owner.is_zero() || now >= self.expiration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn availability_flips_exactly_at_expiration() {
        let rec = NameRecord::new(LabelId::from_bytes([1; 32]), Address::from_bytes([2; 20]), 100);
        assert!(!rec.is_available(99));
        assert!(rec.is_available(100));
        assert!(rec.is_available(101));
    }

    #[test]
    fn zero_owner_is_always_available() {
        let rec = NameRecord::new(LabelId::from_bytes([1; 32]), Address::ZERO, i64::MAX);
        assert!(rec.is_available(0));
    }
}
