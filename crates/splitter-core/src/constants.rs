//! Ledger constants. All amounts are in the smallest unit of the distributed asset.

use crate::types::Weight;

/// Largest amount that may enter share computation or the running deposit total.
///
/// Weights are `u32`, so `MAX_DISTRIBUTION_AMOUNT * Weight::MAX < 2^128` and the
/// `u128` accumulator used by [`share`](crate::math::share) cannot overflow.
pub const MAX_DISTRIBUTION_AMOUNT: u128 = (1u128 << 96) - 1;

/// Default cap on a single deposit and on `total_deposited`.
pub const MAXIMUM_DEPOSIT: u128 = MAX_DISTRIBUTION_AMOUNT;

/// Maximum number of memberships a single instance can hold (8-bit ids).
pub const MAX_MEMBERSHIPS: usize = u8::MAX as usize;

/// Largest weight a single membership may carry.
pub const MAX_WEIGHT: Weight = Weight::MAX;

/// Default log filter for binaries.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment prefix for configuration overrides (`SPLITTER_MODE=push`).
pub const CONFIG_ENV_PREFIX: &str = "SPLITTER";
