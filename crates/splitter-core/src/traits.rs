//! Trait interfaces for the collaborators a ledger depends on.
//!
//! - [`MembershipRegistry`]: weighted, ownable memberships ([`MembershipTable`](crate::registry::MembershipTable) implements)
//! - [`AssetBank`]: balances and outbound transfers ([`MemoryBank`](crate::bank::MemoryBank) implements)
//!
//! Ledgers only ever read current ownership through the registry; they never
//! cache owners.

use crate::error::{RegistryError, SplitError, TransferError};
use crate::types::{Address, Amount, AssetId, MembershipId, TotalWeight, Transfer, Weight};

/// Weighted membership registry.
///
/// Issues one identity per member and tracks its current owner. Weights and
/// the total weight are fixed once the registry is initialized.
pub trait MembershipRegistry: Send + Sync {
    /// Current owner of a membership.
    fn owner_of(&self, id: MembershipId) -> Result<Address, SplitError>;

    /// Number of memberships currently owned by `owner`.
    fn balance_of(&self, owner: &Address) -> u32;

    /// Weight of a membership.
    fn weight_of(&self, id: MembershipId) -> Result<Weight, SplitError>;

    /// Sum of all membership weights.
    fn total_weight(&self) -> Result<TotalWeight, SplitError>;

    /// Number of memberships. Ids are `0..member_count()`.
    fn member_count(&self) -> usize;

    /// Reassign ownership of `id` from `from` to `to`.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::UnknownMembership`] if `id` does not exist
    /// - [`RegistryError::NotCurrentOwner`] if `from` does not own `id`
    fn transfer_ownership(&mut self, id: MembershipId, from: &Address, to: &Address) -> Result<(), SplitError>;

    /// Whether `account` holds at least one membership.
    ///
    /// Default implementation: `balance_of(account) > 0`.
    fn is_member(&self, account: &Address) -> bool {
        self.balance_of(account) > 0
    }

    /// All membership ids in ascending order.
    fn ids(&self) -> Vec<MembershipId> {
        (0..self.member_count())
            .filter_map(|i| u8::try_from(i).ok().map(MembershipId))
            .collect()
    }

    /// Ids owned by `owner`, ascending.
    ///
    /// Default implementation scans [`ids`](Self::ids).
    fn ids_owned_by(&self, owner: &Address) -> Vec<MembershipId> {
        self.ids()
            .into_iter()
            .filter(|id| self.owner_of(*id).map(|o| o == *owner).unwrap_or(false))
            .collect()
    }

    /// Reject unknown ids.
    fn ensure_exists(&self, id: MembershipId) -> Result<(), SplitError> {
        if id.index() >= self.member_count() {
            return Err(RegistryError::UnknownMembership(id).into());
        }
        Ok(())
    }
}

/// Fungible asset balances and outbound transfers.
///
/// Covers both token assets (balance, transfer, transfer-from with an
/// allowance) and the native currency (push payment from the spender's own
/// balance).
pub trait AssetBank: Send + Sync {
    /// Balance of `asset` held by `holder`.
    fn balance_of(&self, asset: &AssetId, holder: &Address) -> Amount;

    /// Execute every leg on behalf of `spender`, all or nothing.
    ///
    /// A token leg whose `from` differs from `spender` consumes the allowance
    /// `from -> spender`. A native leg must have `from == spender`.
    /// Implementations must leave balances and allowances untouched when any
    /// leg fails.
    fn execute(&mut self, spender: &Address, transfers: &[Transfer]) -> Result<(), TransferError>;

    /// Move `amount` of `asset` from `from` (the spender) to `to`.
    fn transfer(&mut self, asset: AssetId, from: &Address, to: &Address, amount: Amount) -> Result<(), TransferError> {
        self.execute(from, &[Transfer { asset, from: *from, to: *to, amount }])
    }

    /// Move `amount` of `asset` from `from` to `to` using `spender`'s allowance.
    fn transfer_from(
        &mut self,
        asset: AssetId,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TransferError> {
        self.execute(spender, &[Transfer { asset, from: *from, to: *to, amount }])
    }
}
