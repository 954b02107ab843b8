//! Push distributor: stateless, single-pass proportional payouts.
//!
//! A distribution computes `share(weight, total_weight, amount)` for every
//! membership in ascending id order and pays each current owner directly
//! from the source. No per-member state is kept between calls.
//!
//! The distribution amount is either the whole balance of the source,
//! clamped to [`MAX_DISTRIBUTION_AMOUNT`] with the excess left at the source
//! for a follow-up call, or an explicit amount that must not exceed the cap.
//!
//! All legs of a call go to the bank as one all-or-nothing batch: if any
//! payout fails, no member is paid.

use serde::Serialize;
use tracing::{debug, info, warn};

use splitter_core::constants::MAX_DISTRIBUTION_AMOUNT;
use splitter_core::error::{AuthorizationError, EmptyOperationError, SplitError};
use splitter_core::events::SplitEvent;
use splitter_core::math::{cap_amount, ensure_within, share};
use splitter_core::traits::{AssetBank, MembershipRegistry};
use splitter_core::types::{payout_total, Address, Amount, AssetId, Payout, Transfer};

/// Outcome (or preview) of one single-asset distribution.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct DistributionReport {
    pub asset: AssetId,
    pub source: Address,
    /// Amount split among memberships (after capping).
    pub amount: Amount,
    /// Sum of all payouts; `amount - distributed` is truncation dust.
    pub distributed: Amount,
    /// Source balance left untouched by this call, including anything above the cap.
    pub remainder: Amount,
    pub payouts: Vec<Payout>,
}

impl DistributionReport {
    /// Truncation dust that stays at the source.
    pub fn dust(&self) -> Amount {
        self.amount - self.distributed
    }

    fn legs(&self) -> impl Iterator<Item = Transfer> + '_ {
        self.payouts
            .iter()
            .filter(|p| p.amount > 0)
            .map(|p| Transfer {
                asset: self.asset,
                from: self.source,
                to: p.owner,
                amount: p.amount,
            })
    }
}

/// Immediate proportional payout of a specific amount to all members.
pub struct PushDistributor<R, B> {
    /// Account the distributor acts as (spender of allowances, holder of
    /// self-funded balances).
    address: Address,
    /// Asset used by [`settle`](crate::Distribution::settle) and previews.
    asset: AssetId,
    registry: R,
    bank: B,
    events: Vec<SplitEvent>,
}

impl<R: MembershipRegistry, B: AssetBank> PushDistributor<R, B> {
    /// Create a distributor.
    ///
    /// # Errors
    ///
    /// Fails if the registry is not initialized or its total weight is zero.
    pub fn new(address: Address, asset: AssetId, registry: R, bank: B) -> Result<Self, SplitError> {
        registry.total_weight()?;
        Ok(Self {
            address,
            asset,
            registry,
            bank,
            events: Vec::new(),
        })
    }

    /// Split `asset` held by `source` among all memberships and pay it out.
    ///
    /// With `amount == None` the whole balance of `source` is used, capped at
    /// [`MAX_DISTRIBUTION_AMOUNT`]. A `source` other than the distributor
    /// must have approved the distributor for token assets; native currency
    /// can only be pushed from the distributor's own balance.
    ///
    /// # Errors
    ///
    /// - [`AuthorizationError::NotAMember`] if `caller` holds no membership
    /// - [`OverflowError::AmountExceedsCap`](splitter_core::error::OverflowError::AmountExceedsCap)
    ///   if an explicit amount exceeds the cap
    /// - [`EmptyOperationError::NothingToDistribute`] if the amount is zero or
    ///   every share of it rounds down to zero
    /// - [`TransferError`](splitter_core::error::TransferError) if any payout fails
    pub fn distribute(
        &mut self,
        caller: &Address,
        asset: AssetId,
        source: &Address,
        amount: Option<Amount>,
    ) -> Result<DistributionReport, SplitError> {
        self.ensure_member(caller)?;
        let report = self.simulate(asset, source, amount)?;
        if report.distributed == 0 {
            debug!(%asset, %source, amount = report.amount, "distributor: no share reaches a member");
            return Err(EmptyOperationError::NothingToDistribute(*source).into());
        }
        let legs: Vec<Transfer> = report.legs().collect();
        self.bank.execute(&self.address, &legs)?;
        self.record(&report);
        Ok(report)
    }

    /// Distribute the distributor's own native balance.
    pub fn distribute_native(&mut self, caller: &Address) -> Result<DistributionReport, SplitError> {
        let own = self.address;
        self.distribute(caller, AssetId::Native, &own, None)
    }

    /// Distribute the full balance of several assets held by `source`.
    ///
    /// Each asset is split on its own; assets where no member would receive
    /// anything are skipped and duplicates are ignored. All legs of all assets are
    /// executed as one batch.
    ///
    /// # Errors
    ///
    /// [`EmptyOperationError::NothingToDistribute`] if every asset is empty,
    /// otherwise as [`distribute`](Self::distribute).
    pub fn distribute_many(
        &mut self,
        caller: &Address,
        assets: &[AssetId],
        source: &Address,
    ) -> Result<Vec<DistributionReport>, SplitError> {
        self.ensure_member(caller)?;

        let mut seen = Vec::with_capacity(assets.len());
        let mut reports = Vec::with_capacity(assets.len());
        for asset in assets {
            if seen.contains(asset) {
                continue;
            }
            seen.push(*asset);
            let report = self.simulate(*asset, source, None)?;
            if report.distributed == 0 {
                debug!(%asset, %source, amount = report.amount, "distributor: skipping empty asset");
                continue;
            }
            reports.push(report);
        }
        if reports.is_empty() {
            return Err(EmptyOperationError::NothingToDistribute(*source).into());
        }

        let legs: Vec<Transfer> = reports.iter().flat_map(|r| r.legs()).collect();
        self.bank.execute(&self.address, &legs)?;
        for report in &reports {
            self.record(report);
        }
        Ok(reports)
    }

    /// Preview a distribution without moving funds or checking the caller.
    pub fn simulate(
        &self,
        asset: AssetId,
        source: &Address,
        amount: Option<Amount>,
    ) -> Result<DistributionReport, SplitError> {
        let available = self.bank.balance_of(&asset, source);
        let amount = match amount {
            Some(explicit) => ensure_within(explicit, MAX_DISTRIBUTION_AMOUNT)?,
            None => cap_amount(available).0,
        };

        let total_weight = self.registry.total_weight()?;
        let mut payouts = Vec::with_capacity(self.registry.member_count());
        for id in self.registry.ids() {
            let weight = self.registry.weight_of(id)?;
            payouts.push(Payout {
                id,
                owner: self.registry.owner_of(id)?,
                amount: share(weight, total_weight, amount)?,
            });
        }
        let distributed = payout_total(&payouts);
        Ok(DistributionReport {
            asset,
            source: *source,
            amount,
            distributed,
            remainder: available.saturating_sub(distributed),
            payouts,
        })
    }

    /// Preview a distribution of the distributor's own native balance.
    pub fn simulate_native(&self) -> Result<DistributionReport, SplitError> {
        self.simulate(AssetId::Native, &self.address, None)
    }

    fn record(&mut self, report: &DistributionReport) {
        let recipients = report.payouts.iter().filter(|p| p.amount > 0).count();
        info!(
            asset = %report.asset,
            source = %report.source,
            amount = report.distributed,
            recipients,
            remainder = report.remainder,
            "distributor: distributed"
        );
        self.events.push(SplitEvent::Distributed {
            asset: report.asset,
            source: report.source,
            amount: report.distributed,
            recipients,
        });
    }

    fn ensure_member(&self, caller: &Address) -> Result<(), AuthorizationError> {
        if !self.registry.is_member(caller) {
            warn!(%caller, "distributor: caller holds no membership");
            return Err(AuthorizationError::NotAMember(*caller));
        }
        Ok(())
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn asset(&self) -> AssetId {
        self.asset
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
}
