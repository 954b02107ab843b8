//! Share calculator and overflow guard.
//!
//! All arithmetic is integer-only with a `u128` accumulator. Amounts entering
//! share computation are capped at [`MAX_DISTRIBUTION_AMOUNT`] and weights are
//! `u32`, so `value * weight` always fits the accumulator. Rounding is floor
//! division; the remainder (dust) is never redistributed.

use crate::constants::MAX_DISTRIBUTION_AMOUNT;
use crate::error::{OverflowError, SetupError, SplitError};
use crate::types::{Amount, TotalWeight, Weight};

/// Proportional share of `value` for a membership with `weight`.
///
/// Computes `floor(value * weight / total_weight)`.
///
/// # Errors
///
/// - [`SetupError::ZeroTotalWeight`] if `total_weight == 0`
/// - [`OverflowError::AmountExceedsCap`] if `value > MAX_DISTRIBUTION_AMOUNT`
pub fn share(weight: Weight, total_weight: TotalWeight, value: Amount) -> Result<Amount, SplitError> {
    if total_weight == 0 {
        return Err(SetupError::ZeroTotalWeight.into());
    }
    if value > MAX_DISTRIBUTION_AMOUNT {
        return Err(OverflowError::AmountExceedsCap {
            amount: value,
            max: MAX_DISTRIBUTION_AMOUNT,
        }
        .into());
    }
    let product = value
        .checked_mul(weight as u128)
        .ok_or(OverflowError::Arithmetic)?;
    Ok(product / total_weight as u128)
}

/// Shares of `value` for every weight, in table order.
///
/// The result sums to at most `value`; see [`dust`].
pub fn split(weights: &[Weight], total_weight: TotalWeight, value: Amount) -> Result<Vec<Amount>, SplitError> {
    weights
        .iter()
        .map(|&w| share(w, total_weight, value))
        .collect()
}

/// Truncation remainder left over when `value` is split by `shares`.
pub fn dust(value: Amount, shares: &[Amount]) -> Amount {
    let paid = shares.iter().fold(0u128, |acc, s| acc.saturating_add(*s));
    value.saturating_sub(paid)
}

/// Clamp a raw amount to the distribution cap.
///
/// Returns `(capped, remainder)` where `capped <= MAX_DISTRIBUTION_AMOUNT` and
/// `capped + remainder == raw`. The remainder is left for a follow-up call.
pub fn cap_amount(raw: Amount) -> (Amount, Amount) {
    let capped = raw.min(MAX_DISTRIBUTION_AMOUNT);
    (capped, raw - capped)
}

/// Reject `amount` if it exceeds `max`.
pub fn ensure_within(amount: Amount, max: Amount) -> Result<Amount, OverflowError> {
    if amount > max {
        return Err(OverflowError::AmountExceedsCap { amount, max });
    }
    Ok(amount)
}

/// Sum of weights, or `None` on overflow.
pub fn total_weight(weights: impl IntoIterator<Item = Weight>) -> Option<TotalWeight> {
    weights
        .into_iter()
        .try_fold(0u64, |acc, w| acc.checked_add(w as u64))
}
