//! Splitter configuration.
//!
//! Provides [`SplitConfig`] with defaults for the distribution mode, the
//! distributed asset and logging. Loaded from a TOML or JSON file layered
//! with `SPLITTER_`-prefixed environment overrides (`SPLITTER_MODE=push`).

use std::fmt;
use std::path::Path;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use splitter_core::constants::{CONFIG_ENV_PREFIX, DEFAULT_LOG_LEVEL, MAXIMUM_DEPOSIT};
use splitter_core::error::SplitError;
use splitter_core::registry::MembershipTable;
use splitter_core::types::{Address, Amount, AssetId, Weight};
use thiserror::Error;

/// Errors raised while loading or validating a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config source: {0}")] Source(#[from] config::ConfigError),
    #[error("invalid config: {0}")] Invalid(#[from] SplitError),
}

/// Which strategy an instance runs.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DistributionMode {
    /// Reconcile deposits and let members claim.
    #[default]
    Pull,
    /// Pay every member immediately on distribute.
    Push,
}

/// One `(owner, weight)` pair of the initial membership list.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MemberConfig {
    pub owner: Address,
    pub weight: Weight,
}

/// Configuration for one splitter instance.
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct SplitConfig {
    /// Pull ledger or push distributor.
    pub mode: DistributionMode,
    /// Account the instance holds funds and spends allowances as.
    pub address: Address,
    /// Asset distributed.
    pub asset: AssetId,
    /// Cap on a single deposit and on the running deposited total.
    /// `None` uses [`MAXIMUM_DEPOSIT`]. Caps above `i64::MAX` must be
    /// written as decimal strings since TOML integers are 64-bit.
    #[serde(deserialize_with = "deserialize_cap")]
    pub max_deposit: Option<Amount>,
    /// Initial membership list, ids assigned in order.
    pub members: Vec<MemberConfig>,
    /// Log level filter string (e.g. "info", "debug", "splitter_ledger=trace").
    pub log_level: String,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            mode: DistributionMode::default(),
            address: Address::ZERO,
            asset: AssetId::Native,
            max_deposit: None,
            members: Vec::new(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl SplitConfig {
    /// Load from `path` (format by extension) with environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let cfg: Self = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix(CONFIG_ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;
        Ok(cfg)
    }

    /// Membership list as `(owner, weight)` pairs.
    pub fn member_list(&self) -> Vec<(Address, Weight)> {
        self.members.iter().map(|m| (m.owner, m.weight)).collect()
    }

    /// Deposit cap as an amount.
    pub fn max_deposit(&self) -> Amount {
        self.max_deposit.unwrap_or(MAXIMUM_DEPOSIT)
    }

    /// Build and initialize the in-memory registry from the member list.
    pub fn build_registry(&self) -> Result<MembershipTable, ConfigError> {
        Ok(MembershipTable::with_members(&self.member_list())?)
    }
}

/// Accepts an unsigned integer or a decimal string for an optional amount.
fn deserialize_cap<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Amount>, D::Error> {
    struct CapVisitor;

    impl<'de> Visitor<'de> for CapVisitor {
        type Value = Option<Amount>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a non-negative integer or decimal string")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
            deserializer.deserialize_any(self)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(Amount::from(v)))
        }

        fn visit_u128<E: de::Error>(self, v: u128) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Amount::try_from(v)
                .map(Some)
                .map_err(|_| E::custom(format!("negative deposit cap: {v}")))
        }

        fn visit_i128<E: de::Error>(self, v: i128) -> Result<Self::Value, E> {
            Amount::try_from(v)
                .map(Some)
                .map_err(|_| E::custom(format!("negative deposit cap: {v}")))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            v.trim()
                .parse::<Amount>()
                .map(Some)
                .map_err(|e| E::custom(format!("deposit cap {v:?}: {e}")))
        }
    }

    deserializer.deserialize_option(CapVisitor)
}
