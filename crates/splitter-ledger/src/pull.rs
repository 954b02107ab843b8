//! Pull ledger: reconciliation and idempotent claims.
//!
//! Funds reach the ledger either by [`deposit`](PullLedger::deposit), which
//! pulls the whole balance of a source through an allowance, or by a plain
//! transfer followed by [`register`](PullLedger::register). Both fold the
//! unaccounted balance into `total_deposited`:
//!
//! `unaccounted = held + total_claimed - total_deposited`
//!
//! A membership may then claim `share(weight, total_weight, total_deposited)`
//! minus what it already claimed, at any time and in any order.
//!
//! Every operation stages its state changes, executes the outbound transfers
//! as one all-or-nothing bank batch, and only then commits.

use tracing::{debug, info, warn};

use splitter_core::constants::{MAXIMUM_DEPOSIT, MAX_DISTRIBUTION_AMOUNT};
use splitter_core::error::{
    AuthorizationError, EmptyOperationError, OverflowError, SetupError, SplitError,
};
use splitter_core::events::SplitEvent;
use splitter_core::math::share;
use splitter_core::traits::{AssetBank, MembershipRegistry};
use splitter_core::types::{Address, Amount, AssetId, MembershipId, Payout, TotalWeight, Transfer};

use crate::state::LedgerState;

/// Claims ledger for a single asset.
pub struct PullLedger<R, B> {
    /// Account holding the ledger's funds.
    address: Address,
    asset: AssetId,
    /// Cap on a single deposit and on `total_deposited`.
    max_deposit: Amount,
    registry: R,
    bank: B,
    state: LedgerState,
    events: Vec<SplitEvent>,
}

impl<R: MembershipRegistry, B: AssetBank> PullLedger<R, B> {
    /// Create a ledger with the default deposit cap.
    ///
    /// # Errors
    ///
    /// Fails if the registry is not initialized or its total weight is zero.
    pub fn new(address: Address, asset: AssetId, registry: R, bank: B) -> Result<Self, SplitError> {
        Self::with_max_deposit(address, asset, registry, bank, MAXIMUM_DEPOSIT)
    }

    /// Create a ledger with a custom deposit cap.
    ///
    /// # Errors
    ///
    /// - [`SetupError::MaxDepositTooLarge`] if `max_deposit > MAX_DISTRIBUTION_AMOUNT`
    /// - registry errors if the registry is not initialized
    pub fn with_max_deposit(
        address: Address,
        asset: AssetId,
        registry: R,
        bank: B,
        max_deposit: Amount,
    ) -> Result<Self, SplitError> {
        Self::restore(address, asset, registry, bank, max_deposit, LedgerState::new())
    }

    /// Rebuild a ledger around previously persisted state.
    ///
    /// Rejects states whose totals disagree, whose deposited total exceeds
    /// `max_deposit`, or that credit any membership with more than its share
    /// of `total_deposited`.
    pub fn restore(
        address: Address,
        asset: AssetId,
        registry: R,
        bank: B,
        max_deposit: Amount,
        state: LedgerState,
    ) -> Result<Self, SplitError> {
        if max_deposit > MAX_DISTRIBUTION_AMOUNT {
            return Err(SetupError::MaxDepositTooLarge {
                max: max_deposit,
                cap: MAX_DISTRIBUTION_AMOUNT,
            }
            .into());
        }
        let total_weight = registry.total_weight()?;
        if total_weight == 0 {
            return Err(SetupError::ZeroTotalWeight.into());
        }
        if !state.is_consistent() || state.total_deposited > max_deposit {
            return Err(SetupError::InconsistentState.into());
        }
        for (&id, &claimed) in &state.claimed {
            let entitled = share(registry.weight_of(id)?, total_weight, state.total_deposited)?;
            if claimed > entitled {
                return Err(SetupError::OverClaimed { id, claimed, entitled }.into());
            }
        }
        Ok(Self {
            address,
            asset,
            max_deposit,
            registry,
            bank,
            state,
            events: Vec::new(),
        })
    }

    // ------------------------------------------------------------------
    // Reconciliation
    // ------------------------------------------------------------------

    /// Pull the entire balance of `source` into the ledger and register it.
    ///
    /// Requires an allowance `source -> ledger` for token assets. Returns the
    /// amount registered, which includes any unaccounted balance already held.
    ///
    /// # Errors
    ///
    /// - [`AuthorizationError::NotAMember`] if `caller` holds no membership
    /// - [`EmptyOperationError::NothingToDeposit`] if `source` holds nothing
    /// - [`OverflowError::DepositTooLarge`] if the balance exceeds the cap
    /// - [`EmptyOperationError::NothingToRegister`] if nothing new would be
    ///   registered (e.g. `source` is the ledger and its balance is already
    ///   accounted for)
    /// - [`TransferError`](splitter_core::error::TransferError) if the pull fails
    pub fn deposit(&mut self, caller: &Address, source: &Address) -> Result<Amount, SplitError> {
        self.ensure_member(caller)?;

        let amount = self.bank.balance_of(&self.asset, source);
        if amount == 0 {
            return Err(EmptyOperationError::NothingToDeposit(*source).into());
        }
        if amount > self.max_deposit {
            warn!(%source, amount, max = self.max_deposit, "ledger: deposit too large");
            return Err(OverflowError::DepositTooLarge {
                amount,
                max: self.max_deposit,
            }
            .into());
        }

        let held = self.held();
        let held_after = if *source == self.address {
            held
        } else {
            held.checked_add(amount).ok_or(OverflowError::Arithmetic)?
        };
        let mut staged = self.state.clone();
        let unaccounted = staged.unaccounted(held_after);
        if unaccounted == 0 {
            debug!(%source, "ledger: deposit leaves nothing to register");
            return Err(EmptyOperationError::NothingToRegister.into());
        }
        let total = staged.record_deposit(unaccounted, self.max_deposit)?;

        if *source != self.address {
            self.bank
                .transfer_from(self.asset, &self.address, source, &self.address, amount)?;
        }
        self.commit_registration(staged, unaccounted, total);
        Ok(unaccounted)
    }

    /// Register funds that arrived by direct transfer.
    ///
    /// # Errors
    ///
    /// - [`AuthorizationError::NotAMember`] if `caller` holds no membership
    /// - [`EmptyOperationError::NothingToRegister`] if nothing new arrived
    /// - [`OverflowError::DepositTooLarge`] if the running total would exceed the cap
    pub fn register(&mut self, caller: &Address) -> Result<Amount, SplitError> {
        self.ensure_member(caller)?;

        let unaccounted = self.unregistered();
        if unaccounted == 0 {
            debug!("ledger: nothing to register");
            return Err(EmptyOperationError::NothingToRegister.into());
        }
        let mut staged = self.state.clone();
        let total = staged.record_deposit(unaccounted, self.max_deposit)?;
        self.commit_registration(staged, unaccounted, total);
        Ok(unaccounted)
    }

    fn commit_registration(&mut self, staged: LedgerState, amount: Amount, total: Amount) {
        self.state = staged;
        info!(amount, total_deposited = total, "ledger: registered");
        self.events.push(SplitEvent::Registered {
            amount,
            total_deposited: total,
        });
    }

    // ------------------------------------------------------------------
    // Claims
    // ------------------------------------------------------------------

    /// Withdraw the accrued share of membership `id` to its owner.
    ///
    /// A claim with nothing accrued succeeds and returns 0 without any
    /// transfer or event.
    ///
    /// # Errors
    ///
    /// - [`AuthorizationError::NotOwner`] if `caller` does not own `id`
    /// - [`TransferError`](splitter_core::error::TransferError) if the payout fails
    pub fn claim(&mut self, caller: &Address, id: MembershipId) -> Result<Amount, SplitError> {
        let payouts = self.claim_many(caller, &[id])?;
        Ok(payouts.first().map(|p| p.amount).unwrap_or(0))
    }

    /// Claim for several memberships in the given order.
    ///
    /// Returns one [`Payout`] per requested id (zero amounts included). The
    /// whole batch fails if any id is not owned by `caller` or any payout
    /// fails; nothing is committed in that case. A repeated id sees what the
    /// earlier occurrence left, i.e. zero.
    pub fn claim_many(&mut self, caller: &Address, ids: &[MembershipId]) -> Result<Vec<Payout>, SplitError> {
        let total_weight = self.registry.total_weight()?;
        let mut staged = self.state.clone();
        let mut payouts = Vec::with_capacity(ids.len());

        for &id in ids {
            let owner = self.registry.owner_of(id)?;
            if owner != *caller {
                warn!(%id, %caller, %owner, "ledger: claim by non-owner");
                return Err(AuthorizationError::NotOwner { id, caller: *caller }.into());
            }
            let amount = self.accrued(&staged, id, total_weight)?;
            staged.record_claim(id, amount)?;
            payouts.push(Payout { id, owner, amount });
        }

        let legs: Vec<Transfer> = payouts
            .iter()
            .filter(|p| p.amount > 0)
            .map(|p| Transfer {
                asset: self.asset,
                from: self.address,
                to: p.owner,
                amount: p.amount,
            })
            .collect();
        if legs.is_empty() {
            debug!(%caller, ids = ids.len(), "ledger: nothing to claim");
            return Ok(payouts);
        }
        self.bank.execute(&self.address, &legs)?;

        self.state = staged;
        for p in payouts.iter().filter(|p| p.amount > 0) {
            info!(id = %p.id, owner = %p.owner, amount = p.amount, "ledger: claimed");
            self.events.push(SplitEvent::Claimed {
                id: p.id,
                owner: p.owner,
                amount: p.amount,
            });
        }
        Ok(payouts)
    }

    /// Claim for every membership `caller` currently owns, ascending by id.
    ///
    /// # Errors
    ///
    /// [`AuthorizationError::NotAMember`] if `caller` owns nothing.
    pub fn claim_all(&mut self, caller: &Address) -> Result<Vec<Payout>, SplitError> {
        let ids = self.registry.ids_owned_by(caller);
        if ids.is_empty() {
            return Err(AuthorizationError::NotAMember(*caller).into());
        }
        self.claim_many(caller, &ids)
    }

    fn accrued(&self, state: &LedgerState, id: MembershipId, total_weight: TotalWeight) -> Result<Amount, SplitError> {
        let weight = self.registry.weight_of(id)?;
        let entitled = share(weight, total_weight, state.total_deposited)?;
        Ok(entitled.saturating_sub(state.claimed_by(id)))
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    /// Amount membership `id` could claim right now.
    pub fn claimable(&self, id: MembershipId) -> Result<Amount, SplitError> {
        self.registry.ensure_exists(id)?;
        let total_weight = self.registry.total_weight()?;
        self.accrued(&self.state, id, total_weight)
    }

    /// Held balance not yet reflected in `total_deposited`.
    pub fn unregistered(&self) -> Amount {
        self.state.unaccounted(self.held())
    }

    /// Balance of the ledger's asset held by the ledger.
    pub fn held(&self) -> Amount {
        self.bank.balance_of(&self.asset, &self.address)
    }

    pub fn total_weight(&self) -> Result<TotalWeight, SplitError> {
        self.registry.total_weight()
    }

    /// Number of memberships.
    pub fn total_supply(&self) -> usize {
        self.registry.member_count()
    }

    pub fn total_deposited(&self) -> Amount {
        self.state.total_deposited
    }

    pub fn total_claimed(&self) -> Amount {
        self.state.total_claimed
    }

    pub fn claimed_by(&self, id: MembershipId) -> Amount {
        self.state.claimed_by(id)
    }

    pub fn max_deposit(&self) -> Amount {
        self.max_deposit
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn asset(&self) -> AssetId {
        self.asset
    }

    /// Snapshot of the persisted totals.
    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut R {
        &mut self.registry
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    pub fn bank_mut(&mut self) -> &mut B {
        &mut self.bank
    }

    /// Take the events recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<SplitEvent> {
        std::mem::take(&mut self.events)
    }

    fn ensure_member(&self, caller: &Address) -> Result<(), AuthorizationError> {
        if !self.registry.is_member(caller) {
            warn!(%caller, "ledger: caller holds no membership");
            return Err(AuthorizationError::NotAMember(*caller));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use splitter_core::bank::MemoryBank;
    use splitter_core::error::TransferError;
    use splitter_core::registry::MembershipTable;

    fn addr(seed: u8) -> Address {
        Address::from_seed(seed)
    }

    const LEDGER: u8 = 0xAA;
    const FUNDER: u8 = 0xF0;

    fn token() -> AssetId {
        AssetId::Token(addr(0xEE))
    }

    /// Members 1, 2, 3 with weights [1, 1, 2].
    fn ledger() -> PullLedger<MembershipTable, MemoryBank> {
        ledger_with(&[(addr(1), 1), (addr(2), 1), (addr(3), 2)])
    }

    fn ledger_with(members: &[(Address, u32)]) -> PullLedger<MembershipTable, MemoryBank> {
        let registry = MembershipTable::with_members(members).unwrap();
        PullLedger::new(addr(LEDGER), token(), registry, MemoryBank::new()).unwrap()
    }

    /// Mint `amount` to the funder and approve the ledger for it.
    fn fund(l: &mut PullLedger<MembershipTable, MemoryBank>, amount: Amount) {
        let asset = l.asset();
        let spender = l.address();
        l.bank_mut().mint(asset, &addr(FUNDER), amount).unwrap();
        l.bank_mut().approve(asset, &addr(FUNDER), &spender, amount);
    }

    /// Send `amount` straight to the ledger without registering.
    fn send_direct(l: &mut PullLedger<MembershipTable, MemoryBank>, amount: Amount) {
        let asset = l.asset();
        let to = l.address();
        l.bank_mut().mint(asset, &to, amount).unwrap();
    }

    // --- construction ---

    #[test]
    fn rejects_uninitialized_registry() {
        let err = PullLedger::new(addr(LEDGER), token(), MembershipTable::new(), MemoryBank::new())
            .err()
            .unwrap();
        assert_eq!(err, SplitError::Setup(SetupError::NotInitialized));
    }

    #[test]
    fn rejects_cap_above_distribution_limit() {
        let registry = MembershipTable::with_members(&[(addr(1), 1)]).unwrap();
        let err = PullLedger::with_max_deposit(
            addr(LEDGER),
            token(),
            registry,
            MemoryBank::new(),
            MAX_DISTRIBUTION_AMOUNT + 1,
        )
        .err()
        .unwrap();
        assert!(matches!(err, SplitError::Setup(SetupError::MaxDepositTooLarge { .. })));
    }

    #[test]
    fn rejects_inconsistent_restored_state() {
        let registry = MembershipTable::with_members(&[(addr(1), 1)]).unwrap();
        let state = LedgerState {
            total_deposited: 10,
            total_claimed: 20,
            ..LedgerState::default()
        };
        let err = PullLedger::restore(addr(LEDGER), token(), registry, MemoryBank::new(), MAXIMUM_DEPOSIT, state)
            .err()
            .unwrap();
        assert_eq!(err, SplitError::Setup(SetupError::InconsistentState));
    }

    #[test]
    fn rejects_restored_state_crediting_too_much() {
        // weights [1, 1, 2] over 100 deposited: #0 is entitled to 25
        let mut state = LedgerState::new();
        state.record_deposit(100, MAXIMUM_DEPOSIT).unwrap();
        state.record_claim(MembershipId(0), 30).unwrap();
        assert!(state.is_consistent());

        let registry = MembershipTable::with_members(&[(addr(1), 1), (addr(2), 1), (addr(3), 2)]).unwrap();
        let err = PullLedger::restore(addr(LEDGER), token(), registry, MemoryBank::new(), MAXIMUM_DEPOSIT, state)
            .err()
            .unwrap();
        assert_eq!(
            err,
            SplitError::Setup(SetupError::OverClaimed {
                id: MembershipId(0),
                claimed: 30,
                entitled: 25
            })
        );
    }

    #[test]
    fn rejects_restored_claim_for_unknown_membership() {
        let mut state = LedgerState::new();
        state.record_deposit(100, MAXIMUM_DEPOSIT).unwrap();
        state.record_claim(MembershipId(7), 1).unwrap();
        let registry = MembershipTable::with_members(&[(addr(1), 1)]).unwrap();
        assert!(matches!(
            PullLedger::restore(addr(LEDGER), token(), registry, MemoryBank::new(), MAXIMUM_DEPOSIT, state),
            Err(SplitError::Registry(_))
        ));
    }

    // --- deposit / register ---

    #[test]
    fn deposit_then_claim_one_one_two() {
        let mut l = ledger();
        fund(&mut l, 100);
        assert_eq!(l.deposit(&addr(1), &addr(FUNDER)).unwrap(), 100);
        assert_eq!(l.total_deposited(), 100);
        assert_eq!(l.claimable(MembershipId(0)).unwrap(), 25);
        assert_eq!(l.claimable(MembershipId(1)).unwrap(), 25);
        assert_eq!(l.claimable(MembershipId(2)).unwrap(), 50);

        assert_eq!(l.claim(&addr(1), MembershipId(0)).unwrap(), 25);
        assert_eq!(l.claim(&addr(2), MembershipId(1)).unwrap(), 25);
        assert_eq!(l.claim(&addr(3), MembershipId(2)).unwrap(), 50);

        assert_eq!(l.total_claimed(), 100);
        assert_eq!(l.total_deposited(), 100);
        assert_eq!(l.held(), 0);
        assert_eq!(l.bank().balance_of(&token(), &addr(3)), 50);
    }

    #[test]
    fn deposit_from_empty_source_fails() {
        let mut l = ledger();
        let err = l.deposit(&addr(1), &addr(FUNDER)).unwrap_err();
        assert_eq!(
            err,
            SplitError::EmptyOperation(EmptyOperationError::NothingToDeposit(addr(FUNDER)))
        );
    }

    #[test]
    fn register_right_after_deposit_fails() {
        let mut l = ledger();
        fund(&mut l, 100);
        l.deposit(&addr(1), &addr(FUNDER)).unwrap();
        assert_eq!(
            l.register(&addr(1)).unwrap_err(),
            SplitError::EmptyOperation(EmptyOperationError::NothingToRegister)
        );
    }

    #[test]
    fn deposit_without_allowance_commits_nothing() {
        let mut l = ledger();
        let asset = l.asset();
        l.bank_mut().mint(asset, &addr(FUNDER), 100).unwrap();
        let err = l.deposit(&addr(1), &addr(FUNDER)).unwrap_err();
        assert!(matches!(
            err,
            SplitError::Transfer(TransferError::InsufficientAllowance { .. })
        ));
        assert_eq!(l.total_deposited(), 0);
        assert!(l.drain_events().is_empty());
    }

    #[test]
    fn deposit_above_cap_is_hard_failure() {
        let registry = MembershipTable::with_members(&[(addr(1), 1)]).unwrap();
        let mut l = PullLedger::with_max_deposit(addr(LEDGER), token(), registry, MemoryBank::new(), 1_000)
            .unwrap();
        fund(&mut l, 1_001);
        let err = l.deposit(&addr(1), &addr(FUNDER)).unwrap_err();
        assert_eq!(
            err,
            SplitError::Overflow(OverflowError::DepositTooLarge { amount: 1_001, max: 1_000 })
        );
        // nothing moved
        assert_eq!(l.bank().balance_of(&token(), &addr(FUNDER)), 1_001);
        assert_eq!(l.held(), 0);
    }

    #[test]
    fn running_total_bounded_by_cap() {
        let registry = MembershipTable::with_members(&[(addr(1), 1)]).unwrap();
        let mut l = PullLedger::with_max_deposit(addr(LEDGER), token(), registry, MemoryBank::new(), 1_000)
            .unwrap();
        send_direct(&mut l, 800);
        l.register(&addr(1)).unwrap();
        send_direct(&mut l, 300);
        let err = l.register(&addr(1)).unwrap_err();
        assert_eq!(
            err,
            SplitError::Overflow(OverflowError::DepositTooLarge { amount: 300, max: 200 })
        );
        assert_eq!(l.total_deposited(), 800);
    }

    #[test]
    fn register_picks_up_direct_transfer() {
        let mut l = ledger();
        send_direct(&mut l, 40);
        assert_eq!(l.unregistered(), 40);
        assert_eq!(l.register(&addr(2)).unwrap(), 40);
        assert_eq!(l.unregistered(), 0);
        assert_eq!(l.claimable(MembershipId(2)).unwrap(), 20);
    }

    #[test]
    fn both_workflows_never_double_count() {
        let mut l = ledger();
        send_direct(&mut l, 40);
        fund(&mut l, 60);
        // deposit also sweeps the 40 that arrived directly
        assert_eq!(l.deposit(&addr(1), &addr(FUNDER)).unwrap(), 100);
        l.claim(&addr(3), MembershipId(2)).unwrap();
        send_direct(&mut l, 8);
        assert_eq!(l.register(&addr(3)).unwrap(), 8);
        assert_eq!(l.total_deposited(), 108);
        assert_eq!(l.claimable(MembershipId(2)).unwrap(), 4);
    }

    #[test]
    fn deposit_from_self_registers_held_balance() {
        let mut l = ledger();
        send_direct(&mut l, 12);
        assert_eq!(l.deposit(&addr(1), &addr(LEDGER)).unwrap(), 12);
        assert_eq!(l.held(), 12);
        assert_eq!(l.total_deposited(), 12);
    }

    #[test]
    fn deposit_from_self_with_nothing_new_fails() {
        let mut l = ledger();
        send_direct(&mut l, 100);
        l.register(&addr(1)).unwrap();
        l.drain_events();

        let err = l.deposit(&addr(1), &addr(LEDGER)).unwrap_err();
        assert_eq!(err, SplitError::EmptyOperation(EmptyOperationError::NothingToRegister));
        assert_eq!(l.total_deposited(), 100);
        assert!(l.drain_events().is_empty());
    }

    #[test]
    fn non_member_cannot_deposit_or_register() {
        let mut l = ledger();
        fund(&mut l, 10);
        send_direct(&mut l, 10);
        assert_eq!(
            l.deposit(&addr(9), &addr(FUNDER)).unwrap_err(),
            SplitError::Authorization(AuthorizationError::NotAMember(addr(9)))
        );
        assert_eq!(
            l.register(&addr(9)).unwrap_err(),
            SplitError::Authorization(AuthorizationError::NotAMember(addr(9)))
        );
    }

    #[test]
    fn registration_emits_event() {
        let mut l = ledger();
        send_direct(&mut l, 7);
        l.register(&addr(1)).unwrap();
        assert_eq!(
            l.drain_events(),
            vec![SplitEvent::Registered { amount: 7, total_deposited: 7 }]
        );
    }

    // --- claim ---

    #[test]
    fn second_claim_is_zero_noop() {
        let mut l = ledger();
        fund(&mut l, 100);
        l.deposit(&addr(1), &addr(FUNDER)).unwrap();
        assert_eq!(l.claim(&addr(1), MembershipId(0)).unwrap(), 25);
        l.drain_events();
        assert_eq!(l.claim(&addr(1), MembershipId(0)).unwrap(), 0);
        assert_eq!(l.claimed_by(MembershipId(0)), 25);
        assert!(l.drain_events().is_empty());
    }

    #[test]
    fn claim_by_other_member_rejected() {
        let mut l = ledger();
        fund(&mut l, 100);
        l.deposit(&addr(1), &addr(FUNDER)).unwrap();
        assert_eq!(
            l.claim(&addr(2), MembershipId(0)).unwrap_err(),
            SplitError::Authorization(AuthorizationError::NotOwner {
                id: MembershipId(0),
                caller: addr(2)
            })
        );
    }

    #[test]
    fn claim_by_non_member_rejected() {
        let mut l = ledger();
        assert!(matches!(
            l.claim(&addr(9), MembershipId(0)).unwrap_err(),
            SplitError::Authorization(AuthorizationError::NotOwner { .. })
        ));
        assert!(matches!(
            l.claim_all(&addr(9)).unwrap_err(),
            SplitError::Authorization(AuthorizationError::NotAMember(_))
        ));
    }

    #[test]
    fn claim_unknown_id_rejected() {
        let mut l = ledger();
        assert!(matches!(l.claim(&addr(1), MembershipId(9)), Err(SplitError::Registry(_))));
        assert!(l.claimable(MembershipId(9)).is_err());
    }

    #[test]
    fn claims_accrue_across_deposits() {
        let mut l = ledger();
        send_direct(&mut l, 100);
        l.register(&addr(1)).unwrap();
        assert_eq!(l.claim(&addr(3), MembershipId(2)).unwrap(), 50);
        send_direct(&mut l, 100);
        l.register(&addr(1)).unwrap();
        assert_eq!(l.claim(&addr(3), MembershipId(2)).unwrap(), 50);
        assert_eq!(l.claim(&addr(1), MembershipId(0)).unwrap(), 50);
    }

    #[test]
    fn failed_payout_commits_nothing() {
        let mut l = ledger();
        send_direct(&mut l, 100);
        l.register(&addr(1)).unwrap();
        l.bank_mut().freeze(&addr(1));
        let err = l.claim(&addr(1), MembershipId(0)).unwrap_err();
        assert!(matches!(err, SplitError::Transfer(TransferError::Rejected(_))));
        assert_eq!(l.claimed_by(MembershipId(0)), 0);
        assert_eq!(l.total_claimed(), 0);
        assert_eq!(l.claimable(MembershipId(0)).unwrap(), 25);
    }

    #[test]
    fn claim_many_is_all_or_nothing() {
        let mut l = ledger_with(&[(addr(1), 1), (addr(1), 1), (addr(2), 2)]);
        send_direct(&mut l, 100);
        l.register(&addr(1)).unwrap();
        let err = l
            .claim_many(&addr(1), &[MembershipId(0), MembershipId(2)])
            .unwrap_err();
        assert!(matches!(err, SplitError::Authorization(_)));
        assert_eq!(l.total_claimed(), 0);

        let payouts = l
            .claim_many(&addr(1), &[MembershipId(1), MembershipId(0), MembershipId(1)])
            .unwrap();
        let amounts: Vec<_> = payouts.iter().map(|p| p.amount).collect();
        assert_eq!(amounts, vec![25, 25, 0]);
        assert_eq!(l.bank().balance_of(&token(), &addr(1)), 50);
    }

    #[test]
    fn claim_all_covers_owned_memberships() {
        let mut l = ledger_with(&[(addr(1), 1), (addr(2), 1), (addr(1), 2)]);
        send_direct(&mut l, 100);
        l.register(&addr(2)).unwrap();
        let payouts = l.claim_all(&addr(1)).unwrap();
        assert_eq!(payouts.len(), 2);
        assert_eq!(payouts[0].id, MembershipId(0));
        assert_eq!(payouts[1].id, MembershipId(2));
        assert_eq!(l.total_claimed(), 75);
    }

    #[test]
    fn claim_follows_current_owner() {
        let mut l = ledger();
        send_direct(&mut l, 100);
        l.register(&addr(1)).unwrap();
        l.registry_mut()
            .transfer_ownership(MembershipId(0), &addr(1), &addr(7))
            .unwrap();
        assert!(l.claim(&addr(1), MembershipId(0)).is_err());
        assert_eq!(l.claim(&addr(7), MembershipId(0)).unwrap(), 25);
        assert_eq!(l.bank().balance_of(&token(), &addr(7)), 25);
    }

    #[test]
    fn zero_weight_member_claims_nothing() {
        let mut l = ledger_with(&[(addr(1), 0), (addr(2), 5)]);
        send_direct(&mut l, 100);
        l.register(&addr(1)).unwrap();
        assert_eq!(l.claimable(MembershipId(0)).unwrap(), 0);
        assert_eq!(l.claim(&addr(1), MembershipId(0)).unwrap(), 0);
        assert_eq!(l.claim(&addr(2), MembershipId(1)).unwrap(), 100);
    }

    #[test]
    fn claim_events_recorded() {
        let mut l = ledger();
        send_direct(&mut l, 100);
        l.register(&addr(1)).unwrap();
        l.drain_events();
        l.claim(&addr(2), MembershipId(1)).unwrap();
        assert_eq!(
            l.drain_events(),
            vec![SplitEvent::Claimed { id: MembershipId(1), owner: addr(2), amount: 25 }]
        );
    }

    #[test]
    fn external_drain_does_not_underflow() {
        let mut l = ledger();
        send_direct(&mut l, 100);
        l.register(&addr(1)).unwrap();
        let (asset, ledger_addr) = (l.asset(), l.address());
        l.bank_mut()
            .transfer(asset, &ledger_addr, &addr(FUNDER), 90)
            .unwrap();
        assert_eq!(l.unregistered(), 0);
        assert!(matches!(l.claim(&addr(3), MembershipId(2)), Err(SplitError::Transfer(_))));
    }

    #[test]
    fn restore_resumes_from_snapshot() {
        let mut l = ledger();
        send_direct(&mut l, 100);
        l.register(&addr(1)).unwrap();
        l.claim(&addr(3), MembershipId(2)).unwrap();
        let json = l.state().to_json().unwrap();
        let bank = l.bank().clone();

        let registry = MembershipTable::with_members(&[(addr(1), 1), (addr(2), 1), (addr(3), 2)]).unwrap();
        let state = LedgerState::from_json(&json).unwrap();
        let mut restored =
            PullLedger::restore(addr(LEDGER), token(), registry, bank, MAXIMUM_DEPOSIT, state).unwrap();
        assert_eq!(restored.claim(&addr(3), MembershipId(2)).unwrap(), 0);
        assert_eq!(restored.claim(&addr(1), MembershipId(0)).unwrap(), 25);
    }

    // --- proptest ---

    #[derive(Debug, Clone)]
    enum Op {
        Send(u64),
        Register,
        Claim(u8),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (1u64..1_000_000).prop_map(Op::Send),
            Just(Op::Register),
            (0u8..4).prop_map(Op::Claim),
        ]
    }

    proptest! {
        #[test]
        fn ledger_invariants_hold(
            weights in prop::collection::vec(1u32..1_000, 4),
            ops in prop::collection::vec(op(), 1..40),
        ) {
            let members: Vec<_> = weights.iter().enumerate()
                .map(|(i, w)| (addr(i as u8 + 1), *w))
                .collect();
            let mut l = ledger_with(&members);
            let total_weight: TotalWeight = weights.iter().map(|w| *w as TotalWeight).sum();
            let mut last_deposited = 0;
            let mut last_claimed = vec![0u128; 4];

            for op in ops {
                match op {
                    Op::Send(v) => send_direct(&mut l, v as u128),
                    Op::Register => { let _ = l.register(&addr(1)); }
                    Op::Claim(i) => { l.claim(&addr(i + 1), MembershipId(i)).unwrap(); }
                }
                prop_assert!(l.total_claimed() <= l.total_deposited());
                prop_assert!(l.state().is_consistent());
                for (i, w) in weights.iter().enumerate() {
                    let entitled = share(*w, total_weight, l.total_deposited()).unwrap();
                    prop_assert!(l.claimed_by(MembershipId(i as u8)) <= entitled);
                }
                prop_assert!(l.total_deposited() >= last_deposited);
                last_deposited = l.total_deposited();
                for (i, last) in last_claimed.iter_mut().enumerate() {
                    let now = l.claimed_by(MembershipId(i as u8));
                    prop_assert!(now >= *last);
                    *last = now;
                }
            }

            // every member withdraws; at most one unit of dust per member remains
            for i in 0..4u8 {
                l.claim(&addr(i + 1), MembershipId(i)).unwrap();
                prop_assert_eq!(l.claimable(MembershipId(i)).unwrap(), 0);
            }
            let residual = l.total_deposited() - l.total_claimed();
            prop_assert!(residual <= 3, "residual dust {}", residual);
        }
    }
}
