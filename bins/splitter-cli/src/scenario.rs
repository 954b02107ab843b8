//! Scenario files replayed by `splitter replay`.
//!
//! A scenario is a JSON document with the splitter configuration and an
//! ordered list of steps:
//!
//! ```json
//! {
//!   "config": { "mode": "pull", "address": "0x…", "members": [ … ] },
//!   "steps": [
//!     { "mint": { "to": "0x…", "amount": 100 } },
//!     { "register": { "caller": "0x…" } },
//!     { "claim": { "caller": "0x…" } }
//!   ]
//! }
//! ```

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use splitter_core::bank::MemoryBank;
use splitter_core::events::SplitEvent;
use splitter_core::registry::MembershipTable;
use splitter_core::traits::MembershipRegistry;
use splitter_core::types::{Address, Amount, AssetId, MembershipId, Payout};
use splitter_ledger::{Distribution, DistributionReport, PullLedger, PushDistributor, SplitConfig, Splitter};

#[derive(Deserialize, Debug)]
pub struct Scenario {
    pub config: SplitConfig,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario: {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid scenario: {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// One operation of a scenario.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Credit `amount` of `asset` to `to` out of thin air.
    Mint {
        #[serde(default)]
        asset: AssetId,
        to: Address,
        amount: Amount,
    },
    /// Let the splitter spend `amount` of `owner`'s `asset`.
    Approve {
        #[serde(default)]
        asset: AssetId,
        owner: Address,
        amount: Amount,
    },
    Deposit { caller: Address, source: Address },
    Register { caller: Address },
    /// Claim the listed ids, or every id the caller owns when empty.
    Claim {
        caller: Address,
        #[serde(default)]
        ids: Vec<MembershipId>,
    },
    /// Push distribution; asset and source default to the configured asset
    /// and the splitter's own address.
    Distribute {
        caller: Address,
        asset: Option<AssetId>,
        source: Option<Address>,
        amount: Option<Amount>,
    },
    Settle { caller: Address },
    TransferMembership {
        id: MembershipId,
        from: Address,
        to: Address,
    },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mint { .. } => "mint",
            Self::Approve { .. } => "approve",
            Self::Deposit { .. } => "deposit",
            Self::Register { .. } => "register",
            Self::Claim { .. } => "claim",
            Self::Distribute { .. } => "distribute",
            Self::Settle { .. } => "settle",
            Self::TransferMembership { .. } => "transfer_membership",
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(untagged)]
pub enum StepResult {
    Amount(Amount),
    Payouts(Vec<Payout>),
    Reports(Vec<DistributionReport>),
}

/// One printed line of a replay.
#[derive(Serialize, Debug)]
pub struct StepOutcome {
    pub step: usize,
    pub op: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<StepResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub events: Vec<SplitEvent>,
}

impl StepOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// A splitter over an in-memory bank, driven step by step.
pub struct Replay {
    splitter: Splitter<MembershipTable, MemoryBank>,
}

impl Replay {
    pub fn new(config: &SplitConfig) -> Result<Self> {
        let splitter =
            Splitter::from_config(config, MemoryBank::new()).context("invalid splitter configuration")?;
        Ok(Self { splitter })
    }

    /// Report the registry initialization as step 0.
    pub fn setup(&mut self) -> StepOutcome {
        StepOutcome {
            step: 0,
            op: "initialize",
            result: None,
            error: None,
            events: self.drain_events(),
        }
    }

    /// Run every step, continuing past failures.
    pub fn run_all(&mut self, steps: &[Step]) -> Vec<StepOutcome> {
        steps
            .iter()
            .enumerate()
            .map(|(i, step)| self.run(i + 1, step))
            .collect()
    }

    pub fn run(&mut self, index: usize, step: &Step) -> StepOutcome {
        debug!(step = index, op = step.name(), "replay: applying");
        let (result, error) = match self.apply(step) {
            Ok(result) => (result, None),
            Err(e) => {
                warn!(step = index, op = step.name(), error = %e, "replay: step failed");
                (None, Some(format!("{e:#}")))
            }
        };
        StepOutcome {
            step: index,
            op: step.name(),
            result,
            error,
            events: self.drain_events(),
        }
    }

    pub fn splitter(&self) -> &Splitter<MembershipTable, MemoryBank> {
        &self.splitter
    }

    fn apply(&mut self, step: &Step) -> Result<Option<StepResult>> {
        match step {
            Step::Mint { asset, to, amount } => {
                self.splitter.bank_mut().mint(*asset, to, *amount)?;
                Ok(None)
            }
            Step::Approve { asset, owner, amount } => {
                let spender = self.splitter.address();
                self.splitter.bank_mut().approve(*asset, owner, &spender, *amount);
                Ok(None)
            }
            Step::Deposit { caller, source } => {
                let amount = self.pull()?.deposit(caller, source)?;
                Ok(Some(StepResult::Amount(amount)))
            }
            Step::Register { caller } => {
                let amount = self.pull()?.register(caller)?;
                Ok(Some(StepResult::Amount(amount)))
            }
            Step::Claim { caller, ids } => {
                let ledger = self.pull()?;
                let payouts = if ids.is_empty() {
                    ledger.claim_all(caller)?
                } else {
                    ledger.claim_many(caller, ids)?
                };
                Ok(Some(StepResult::Payouts(payouts)))
            }
            Step::Distribute {
                caller,
                asset,
                source,
                amount,
            } => {
                let distributor = self.push()?;
                let asset = asset.unwrap_or(distributor.asset());
                let source = source.unwrap_or(distributor.address());
                let report = distributor.distribute(caller, asset, &source, *amount)?;
                Ok(Some(StepResult::Reports(vec![report])))
            }
            Step::Settle { caller } => Ok(Some(StepResult::Payouts(self.splitter.settle(caller)?))),
            Step::TransferMembership { id, from, to } => {
                self.splitter.registry_mut().transfer_ownership(*id, from, to)?;
                Ok(None)
            }
        }
    }

    fn pull(&mut self) -> Result<&mut PullLedger<MembershipTable, MemoryBank>> {
        self.splitter
            .as_pull_mut()
            .ok_or_else(|| anyhow!("step requires a pull-mode splitter"))
    }

    fn push(&mut self) -> Result<&mut PushDistributor<MembershipTable, MemoryBank>> {
        self.splitter
            .as_push_mut()
            .ok_or_else(|| anyhow!("step requires a push-mode splitter"))
    }

    fn drain_events(&mut self) -> Vec<SplitEvent> {
        let mut events = self.splitter.registry_mut().drain_events();
        events.extend(Distribution::drain_events(&mut self.splitter));
        events
    }
}
