//! In-memory asset bank.
//!
//! [`MemoryBank`] keeps balances per `(asset, holder)`, token allowances per
//! `(asset, owner, spender)` and a set of frozen accounts. Every batch passed
//! to [`AssetBank::execute`] is applied to a staged copy and only swapped in
//! once every leg has succeeded.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::error::TransferError;
use crate::traits::AssetBank;
use crate::types::{Address, Amount, AssetId, Transfer};

/// Balances and allowances for any number of assets.
///
/// Frozen accounts reject every leg that debits or credits them, which models
/// a token that blocks an address or a recipient that refuses payment.
#[derive(Clone, Debug, Default)]
pub struct MemoryBank {
    balances: HashMap<(AssetId, Address), Amount>,
    allowances: HashMap<(AssetId, Address, Address), Amount>,
    frozen: HashSet<Address>,
}

impl MemoryBank {
    /// Create an empty bank.
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` of `asset` to `holder` out of thin air.
    pub fn mint(&mut self, asset: AssetId, holder: &Address, amount: Amount) -> Result<(), TransferError> {
        let balance = self.balances.entry((asset, *holder)).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(TransferError::BalanceOverflow(*holder))?;
        debug!(%asset, %holder, amount, "bank: minted");
        Ok(())
    }

    /// Set the allowance `owner -> spender` for a token asset.
    pub fn approve(&mut self, asset: AssetId, owner: &Address, spender: &Address, amount: Amount) {
        self.allowances.insert((asset, *owner, *spender), amount);
        debug!(%asset, %owner, %spender, amount, "bank: approved");
    }

    /// Remaining allowance `owner -> spender`.
    pub fn allowance(&self, asset: &AssetId, owner: &Address, spender: &Address) -> Amount {
        *self.allowances.get(&(*asset, *owner, *spender)).unwrap_or(&0)
    }

    /// Make every leg touching `account` fail.
    pub fn freeze(&mut self, account: &Address) {
        self.frozen.insert(*account);
    }

    /// Lift a freeze.
    pub fn unfreeze(&mut self, account: &Address) {
        self.frozen.remove(account);
    }

    /// Sum of all balances of `asset`.
    pub fn supply(&self, asset: &AssetId) -> Amount {
        self.balances
            .iter()
            .filter(|((a, _), _)| a == asset)
            .fold(0u128, |acc, (_, v)| acc.saturating_add(*v))
    }

    fn apply(&mut self, spender: &Address, leg: &Transfer) -> Result<(), TransferError> {
        if self.frozen.contains(&leg.from) || self.frozen.contains(&leg.to) {
            let frozen = if self.frozen.contains(&leg.from) { leg.from } else { leg.to };
            return Err(TransferError::Rejected(format!("account {frozen} is frozen")));
        }

        if leg.from != *spender {
            if leg.asset.is_native() {
                return Err(TransferError::NativePullNotAllowed {
                    spender: *spender,
                    from: leg.from,
                });
            }
            let key = (leg.asset, leg.from, *spender);
            let have = *self.allowances.get(&key).unwrap_or(&0);
            if have < leg.amount {
                return Err(TransferError::InsufficientAllowance {
                    owner: leg.from,
                    spender: *spender,
                    have,
                    need: leg.amount,
                });
            }
            self.allowances.insert(key, have - leg.amount);
        }

        let have = self.balance_of(&leg.asset, &leg.from);
        if have < leg.amount {
            return Err(TransferError::InsufficientBalance {
                asset: leg.asset,
                holder: leg.from,
                have,
                need: leg.amount,
            });
        }
        self.balances.insert((leg.asset, leg.from), have - leg.amount);

        let to = self.balances.entry((leg.asset, leg.to)).or_insert(0);
        *to = to
            .checked_add(leg.amount)
            .ok_or(TransferError::BalanceOverflow(leg.to))?;
        Ok(())
    }
}

impl AssetBank for MemoryBank {
    fn balance_of(&self, asset: &AssetId, holder: &Address) -> Amount {
        *self.balances.get(&(*asset, *holder)).unwrap_or(&0)
    }

    fn execute(&mut self, spender: &Address, transfers: &[Transfer]) -> Result<(), TransferError> {
        let mut staged = self.clone();
        for (index, leg) in transfers.iter().enumerate() {
            if let Err(e) = staged.apply(spender, leg) {
                warn!(%spender, index, legs = transfers.len(), error = %e, "bank: batch rejected");
                return Err(e);
            }
        }
        *self = staged;
        debug!(%spender, legs = transfers.len(), "bank: batch executed");
        Ok(())
    }
}
