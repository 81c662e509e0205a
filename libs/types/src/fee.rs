//! Fee calculation types
//!
//! Creation fees are quoted against the *net* voucher value: a creator who
//! wants a voucher worth `V` attaches `V + V·rate` and the fee is exactly
//! `V·rate`. Small vouchers pay a flat minimum instead.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amount;
use crate::errors::{AmountError, FeeError};

/// Basis-point denominator (100 bps = 1%).
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Share of an expired claim's deposit credited to the voucher (20%).
pub const RECLAIM_BONUS_BPS: u32 = 2_000;

/// Default proportional creation fee (2%).
pub const DEFAULT_CREATION_FEE_RATE_BPS: u32 = 200;

/// Default flat creation fee floor (0.005).
pub fn default_min_creation_fee() -> Decimal {
    Decimal::new(5, 3)
}

/// Creation fee configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeParams {
    /// Flat floor charged when the proportional fee is smaller
    pub min_creation_fee: Decimal,
    /// Proportional fee on the net value, in basis points
    pub creation_fee_rate_bps: u32,
}

impl FeeParams {
    /// Build validated fee parameters.
    pub fn new(min_creation_fee: Decimal, creation_fee_rate_bps: u32) -> Result<Self, FeeError> {
        let params = Self {
            min_creation_fee,
            creation_fee_rate_bps,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), FeeError> {
        if self.creation_fee_rate_bps > BPS_DENOMINATOR {
            return Err(FeeError::RateTooHigh {
                rate_bps: self.creation_fee_rate_bps,
                max_bps: BPS_DENOMINATOR,
            });
        }
        amount::validate(self.min_creation_fee)?;
        Ok(())
    }

    /// Proportional rate as a decimal fraction.
    pub fn rate(&self) -> Decimal {
        Decimal::new(i64::from(self.creation_fee_rate_bps), 4)
    }

    /// Split an attached amount into fee and stored value.
    ///
    /// `fee = max(min_creation_fee, attached − attached / (1 + rate))`. The
    /// returned `value` may be zero or negative; whether that is acceptable is
    /// the caller's decision.
    pub fn creation_fee(&self, attached: Decimal) -> Result<CreationFee, AmountError> {
        let divisor = Decimal::ONE + self.rate();
        let net = attached
            .checked_div(divisor)
            .map(amount::round_down)
            .ok_or(AmountError::Overflow)?;
        let proportional = attached.checked_sub(net).ok_or(AmountError::Overflow)?;
        let fee = proportional.max(self.min_creation_fee);
        let value = attached.checked_sub(fee).ok_or(AmountError::Overflow)?;

        Ok(CreationFee {
            attached,
            fee,
            value,
        })
    }

    /// Amount to attach for a voucher of net value `value` when the
    /// proportional fee applies.
    pub fn gross_up(&self, value: Decimal) -> Option<Decimal> {
        value.checked_mul(self.rate())?.checked_add(value)
    }
}

impl Default for FeeParams {
    fn default() -> Self {
        Self {
            min_creation_fee: default_min_creation_fee(),
            creation_fee_rate_bps: DEFAULT_CREATION_FEE_RATE_BPS,
        }
    }
}

/// Result of applying the creation fee to an attached amount.
///
/// Invariant: attached = fee + value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreationFee {
    pub attached: Decimal,
    pub fee: Decimal,
    pub value: Decimal,
}

impl CreationFee {
    /// Whether the voucher would hold a positive value.
    pub fn is_viable(&self) -> bool {
        self.value > Decimal::ZERO
    }
}

/// Split of a forfeited claim deposit.
///
/// Invariant: deposit = credit + retained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForfeitSplit {
    /// Carried forward to the voucher's next successful redeemer
    pub credit: Decimal,
    /// Leaves escrow to the protocol
    pub retained: Decimal,
}

/// Split an expired claim's deposit into the reclaim bonus and the protocol share.
pub fn split_forfeited_deposit(deposit: Decimal) -> Result<ForfeitSplit, AmountError> {
    let credit = amount::bps_share(deposit, RECLAIM_BONUS_BPS)?;
    let retained = deposit.checked_sub(credit).ok_or(AmountError::Overflow)?;
    Ok(ForfeitSplit { credit, retained })
}
