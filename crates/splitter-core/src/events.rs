//! Observable side effects of ledger and registry operations.

use serde::Serialize;

use crate::types::{Address, Amount, AssetId, MembershipId, TotalWeight};

/// An event recorded by a committed operation.
///
/// Serialized as `{"event": "claimed", ...}` for log pipelines.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SplitEvent {
    /// The weight table was populated.
    Initialized {
        members: usize,
        total_weight: TotalWeight,
    },
    /// Newly arrived funds were registered as distributable.
    Registered {
        /// Amount registered by this call.
        amount: Amount,
        /// Running total after registration.
        total_deposited: Amount,
    },
    /// A membership withdrew its accrued share.
    Claimed {
        id: MembershipId,
        owner: Address,
        amount: Amount,
    },
    /// A push distribution completed.
    Distributed {
        asset: AssetId,
        source: Address,
        /// Sum of all payouts (excludes dust).
        amount: Amount,
        recipients: usize,
    },
    /// A membership changed hands.
    OwnershipTransferred {
        id: MembershipId,
        from: Address,
        to: Address,
    },
}
