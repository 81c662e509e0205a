//! Fixed-point monetary amounts
//!
//! Uses rust_decimal for deterministic arithmetic (no floating-point errors).
//! Amounts carry at most 18 decimal places, one base unit being 10^-18 of the
//! native currency. Derived shares are rounded toward zero and their
//! complements are computed by subtraction, so a split never creates or
//! destroys a base unit.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::errors::AmountError;

/// Maximum number of decimal places an amount may carry.
pub const AMOUNT_SCALE: u32 = 18;

/// Check that an amount is non-negative and representable in base units.
pub fn validate(amount: Decimal) -> Result<Decimal, AmountError> {
    if amount < Decimal::ZERO {
        return Err(AmountError::Negative {
            amount: amount.to_string(),
        });
    }
    if amount.normalize().scale() > AMOUNT_SCALE {
        return Err(AmountError::TooPrecise {
            amount: amount.to_string(),
            max_scale: AMOUNT_SCALE,
        });
    }
    Ok(amount)
}

/// Truncate to whole base units.
pub fn round_down(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::ToZero)
}

/// Share of `amount` expressed in basis points, rounded toward zero.
pub fn bps_share(amount: Decimal, bps: u32) -> Result<Decimal, AmountError> {
    let rate = Decimal::new(i64::from(bps), 4);
    amount
        .checked_mul(rate)
        .map(round_down)
        .ok_or(AmountError::Overflow)
}

/// Overflow-checked sum.
pub fn checked_sum<I>(amounts: I) -> Result<Decimal, AmountError>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, a| acc.checked_add(a))
        .ok_or(AmountError::Overflow)
}
