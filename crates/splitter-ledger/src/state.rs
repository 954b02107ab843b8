//! Persisted pull-ledger totals.
//!
//! [`LedgerState`] is the single mutable aggregate a [`PullLedger`](crate::PullLedger)
//! owns: the running deposited and claimed totals and the per-membership
//! claimed amounts. All three only move forward.
//!
//! Invariants:
//! - `total_claimed == sum(claimed)`
//! - `total_claimed <= total_deposited`

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use splitter_core::error::OverflowError;
use splitter_core::types::{Amount, MembershipId};

/// Running totals and per-membership claimed amounts.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerState {
    /// Everything ever registered as distributable.
    pub total_deposited: Amount,
    /// Everything ever paid out.
    pub total_claimed: Amount,
    /// Paid amount per membership. Absent ids have claimed nothing.
    pub claimed: BTreeMap<MembershipId, Amount>,
}

impl LedgerState {
    /// Fresh state with all totals at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Amount already paid to `id`.
    pub fn claimed_by(&self, id: MembershipId) -> Amount {
        *self.claimed.get(&id).unwrap_or(&0)
    }

    /// Funds held by the ledger that are not yet part of `total_deposited`.
    ///
    /// `held + total_claimed - total_deposited`. Reports 0 if the held
    /// balance was drained below what is still owed.
    pub fn unaccounted(&self, held: Amount) -> Amount {
        held.saturating_add(self.total_claimed)
            .saturating_sub(self.total_deposited)
    }

    /// Amount still owed to memberships in aggregate.
    pub fn outstanding(&self) -> Amount {
        self.total_deposited - self.total_claimed
    }

    /// Add `amount` to the deposited total, bounded by `max`.
    pub fn record_deposit(&mut self, amount: Amount, max: Amount) -> Result<Amount, OverflowError> {
        let total = self
            .total_deposited
            .checked_add(amount)
            .ok_or(OverflowError::Arithmetic)?;
        if total > max {
            return Err(OverflowError::DepositTooLarge {
                amount,
                max: max.saturating_sub(self.total_deposited),
            });
        }
        self.total_deposited = total;
        Ok(total)
    }

    /// Add `amount` to both the membership's claimed amount and the total.
    pub fn record_claim(&mut self, id: MembershipId, amount: Amount) -> Result<(), OverflowError> {
        let total = self
            .total_claimed
            .checked_add(amount)
            .ok_or(OverflowError::Arithmetic)?;
        if total > self.total_deposited {
            return Err(OverflowError::Arithmetic);
        }
        let claimed = self.claimed.entry(id).or_insert(0);
        *claimed = claimed.checked_add(amount).ok_or(OverflowError::Arithmetic)?;
        self.total_claimed = total;
        Ok(())
    }

    /// Check the aggregate invariants.
    pub fn is_consistent(&self) -> bool {
        let sum = self
            .claimed
            .values()
            .try_fold(0u128, |acc, v| acc.checked_add(*v));
        sum == Some(self.total_claimed) && self.total_claimed <= self.total_deposited
    }

    /// Serialize to JSON for persistence between calls.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Restore from [`to_json`](Self::to_json) output.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
