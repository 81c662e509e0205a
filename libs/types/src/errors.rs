//! Error types for amount and fee arithmetic
//!
//! Contract-level errors wrap these through `#[from]`.

use thiserror::Error;

/// Amount validation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AmountError {
    #[error("Negative amount: {amount}")]
    Negative { amount: String },

    #[error("Amount {amount} exceeds {max_scale} decimal places")]
    TooPrecise { amount: String, max_scale: u32 },

    #[error("Arithmetic overflow")]
    Overflow,
}

/// Fee parameter errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeeError {
    #[error("Fee rate {rate_bps} bps exceeds {max_bps} bps")]
    RateTooHigh { rate_bps: u32, max_bps: u32 },

    #[error("Invalid minimum fee: {0}")]
    InvalidMinimum(#[from] AmountError),
}
