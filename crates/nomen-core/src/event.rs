use serde::{Deserialize, Serialize};

use crate::types::{Address, LabelId, Timestamp};

/// Externally observable registry events, appended to a persistent log in
/// the order the serialized ledger applied them.
///
/// Re-registering an expired name emits two `OwnershipTransferred` entries:
/// first the implicit vacate (`to == Address::ZERO`), then the mint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    OwnershipTransferred {
        from: Address,
        to: Address,
        label_id: LabelId,
    },
    ExpirationChanged {
        label_id: LabelId,
        expiration: Timestamp,
    },
}
