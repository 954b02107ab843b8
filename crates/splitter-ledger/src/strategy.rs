//! Distribution strategies behind one interface.
//!
//! [`Distribution`] is implemented by [`PullLedger`] and [`PushDistributor`];
//! [`Splitter`] picks one of them at construction time and delegates to it.

use splitter_core::error::SplitError;
use splitter_core::events::SplitEvent;
use splitter_core::math::share;
use splitter_core::registry::MembershipTable;
use splitter_core::traits::{AssetBank, MembershipRegistry};
use splitter_core::types::{Address, Amount, AssetId, MembershipId, Payout};

use crate::config::{ConfigError, DistributionMode, SplitConfig};
use crate::pull::PullLedger;
use crate::push::PushDistributor;

/// Share computation plus payout, common to both strategies.
pub trait Distribution: Send {
    /// Which strategy this is.
    fn mode(&self) -> DistributionMode;

    /// Account the instance acts as.
    fn address(&self) -> Address;

    /// Asset the instance distributes.
    fn asset(&self) -> AssetId;

    /// Registry the instance reads weights and owners from.
    fn members(&self) -> &dyn MembershipRegistry;

    /// Amount membership `id` would receive if it were paid right now.
    ///
    /// Pull: the claimable amount. Push: its share of the instance's own
    /// balance of [`asset`](Self::asset).
    fn pending(&self, id: MembershipId) -> Result<Amount, SplitError>;

    /// Pay out what is currently owed on behalf of `caller`.
    ///
    /// Pull: claim every membership `caller` owns. Push: distribute the
    /// instance's own balance to all memberships.
    fn settle(&mut self, caller: &Address) -> Result<Vec<Payout>, SplitError>;

    /// Take the events recorded since the last drain.
    fn drain_events(&mut self) -> Vec<SplitEvent>;

    /// Per-membership split of `value` under the current weights, ascending by id.
    ///
    /// Default implementation reads weights and owners from [`members`](Self::members).
    fn simulate_split(&self, value: Amount) -> Result<Vec<Payout>, SplitError> {
        let registry = self.members();
        let total_weight = registry.total_weight()?;
        registry
            .ids()
            .into_iter()
            .map(|id| {
                Ok(Payout {
                    id,
                    owner: registry.owner_of(id)?,
                    amount: share(registry.weight_of(id)?, total_weight, value)?,
                })
            })
            .collect()
    }
}

impl<R, B> Distribution for PullLedger<R, B>
where
    R: MembershipRegistry,
    B: AssetBank,
{
    fn mode(&self) -> DistributionMode {
        DistributionMode::Pull
    }

    fn address(&self) -> Address {
        PullLedger::address(self)
    }

    fn asset(&self) -> AssetId {
        PullLedger::asset(self)
    }

    fn members(&self) -> &dyn MembershipRegistry {
        self.registry()
    }

    fn pending(&self, id: MembershipId) -> Result<Amount, SplitError> {
        self.claimable(id)
    }

    fn settle(&mut self, caller: &Address) -> Result<Vec<Payout>, SplitError> {
        self.claim_all(caller)
    }

    fn drain_events(&mut self) -> Vec<SplitEvent> {
        PullLedger::drain_events(self)
    }
}

impl<R, B> Distribution for PushDistributor<R, B>
where
    R: MembershipRegistry,
    B: AssetBank,
{
    fn mode(&self) -> DistributionMode {
        DistributionMode::Push
    }

    fn address(&self) -> Address {
        PushDistributor::address(self)
    }

    fn asset(&self) -> AssetId {
        PushDistributor::asset(self)
    }

    fn members(&self) -> &dyn MembershipRegistry {
        self.registry()
    }

    fn pending(&self, id: MembershipId) -> Result<Amount, SplitError> {
        self.members().ensure_exists(id)?;
        let own = PushDistributor::address(self);
        let report = self.simulate(PushDistributor::asset(self), &own, None)?;
        Ok(report
            .payouts
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.amount)
            .unwrap_or(0))
    }

    fn settle(&mut self, caller: &Address) -> Result<Vec<Payout>, SplitError> {
        let own = PushDistributor::address(self);
        let asset = PushDistributor::asset(self);
        Ok(self.distribute(caller, asset, &own, None)?.payouts)
    }

    fn drain_events(&mut self) -> Vec<SplitEvent> {
        PushDistributor::drain_events(self)
    }
}

/// A strategy selected at construction time.
pub enum Splitter<R, B> {
    Pull(PullLedger<R, B>),
    Push(PushDistributor<R, B>),
}

impl<R: MembershipRegistry, B: AssetBank> Splitter<R, B> {
    /// Build the strategy named by `mode` around `registry` and `bank`.
    pub fn new(
        mode: DistributionMode,
        address: Address,
        asset: AssetId,
        max_deposit: Amount,
        registry: R,
        bank: B,
    ) -> Result<Self, SplitError> {
        Ok(match mode {
            DistributionMode::Pull => Self::Pull(PullLedger::with_max_deposit(
                address,
                asset,
                registry,
                bank,
                max_deposit,
            )?),
            DistributionMode::Push => Self::Push(PushDistributor::new(address, asset, registry, bank)?),
        })
    }

    /// The selected strategy.
    pub fn strategy(&self) -> &dyn Distribution {
        match self {
            Self::Pull(l) => l,
            Self::Push(d) => d,
        }
    }

    /// The selected strategy, mutably.
    pub fn strategy_mut(&mut self) -> &mut dyn Distribution {
        match self {
            Self::Pull(l) => l,
            Self::Push(d) => d,
        }
    }

    pub fn as_pull_mut(&mut self) -> Option<&mut PullLedger<R, B>> {
        match self {
            Self::Pull(l) => Some(l),
            Self::Push(_) => None,
        }
    }

    pub fn as_push_mut(&mut self) -> Option<&mut PushDistributor<R, B>> {
        match self {
            Self::Push(d) => Some(d),
            Self::Pull(_) => None,
        }
    }

    pub fn registry_mut(&mut self) -> &mut R {
        match self {
            Self::Pull(l) => l.registry_mut(),
            Self::Push(d) => d.registry_mut(),
        }
    }

    pub fn bank(&self) -> &B {
        match self {
            Self::Pull(l) => l.bank(),
            Self::Push(d) => d.bank(),
        }
    }

    pub fn bank_mut(&mut self) -> &mut B {
        match self {
            Self::Pull(l) => l.bank_mut(),
            Self::Push(d) => d.bank_mut(),
        }
    }
}

impl<B: AssetBank> Splitter<MembershipTable, B> {
    /// Build the configured strategy with an in-memory registry populated
    /// from the configured member list.
    pub fn from_config(config: &SplitConfig, bank: B) -> Result<Self, ConfigError> {
        let registry = config.build_registry()?;
        Ok(Self::new(
            config.mode,
            config.address,
            config.asset,
            config.max_deposit(),
            registry,
            bank,
        )?)
    }
}

impl<R: MembershipRegistry, B: AssetBank> Distribution for Splitter<R, B> {
    fn mode(&self) -> DistributionMode {
        self.strategy().mode()
    }

    fn address(&self) -> Address {
        self.strategy().address()
    }

    fn asset(&self) -> AssetId {
        self.strategy().asset()
    }

    fn members(&self) -> &dyn MembershipRegistry {
        self.strategy().members()
    }

    fn pending(&self, id: MembershipId) -> Result<Amount, SplitError> {
        self.strategy().pending(id)
    }

    fn settle(&mut self, caller: &Address) -> Result<Vec<Payout>, SplitError> {
        self.strategy_mut().settle(caller)
    }

    fn drain_events(&mut self) -> Vec<SplitEvent> {
        self.strategy_mut().drain_events()
    }
}
