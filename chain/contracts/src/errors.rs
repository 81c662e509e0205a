//! Contract-specific error types
//!
//! Every rejection is synchronous and leaves no partial state behind. Each
//! voucher error carries a distinct kind so callers can tell "try again later"
//! from "this will never succeed".

use serde::{Deserialize, Serialize};
use thiserror::Error;
use voucher_types::errors::{AmountError, FeeError};
use voucher_types::time::Timestamp;

/// Bank (transfer primitive) errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BankError {
    #[error("Insufficient balance for {account}: required {required}, available {available}")]
    InsufficientBalance {
        account: String,
        required: String,
        available: String,
    },

    #[error("Invalid transfer amount: {0}")]
    InvalidAmount(#[from] AmountError),

    #[error("Arithmetic overflow in balance calculation")]
    Overflow,
}

/// Voucher ledger errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VoucherError {
    #[error("Voucher already exists: {voucher_id}")]
    DuplicateVoucher { voucher_id: String },

    #[error("Voucher not found: {voucher_id}")]
    VoucherNotFound { voucher_id: String },

    #[error("Insufficient funds: attached {attached} does not cover creation fee {fee}")]
    InsufficientFunds { attached: String, fee: String },

    #[error("Wrong claim deposit: expected exactly {expected}, attached {attached}")]
    WrongDepositAmount { expected: String, attached: String },

    #[error("Claim in progress until {expires_at}")]
    ClaimInProgress { expires_at: Timestamp },

    #[error("Caller does not hold the claim on this voucher")]
    NotClaimed,

    #[error("Claim expired at {expired_at}")]
    ClaimExpired { expired_at: Timestamp },

    #[error("Revealed secret does not match commitment")]
    SecretMismatch,

    #[error("Unauthorized: caller is not admin")]
    Unauthorized,

    #[error("Reserved caller: {caller} is the ledger's own escrow account")]
    ReservedCaller { caller: String },

    #[error("Invalid recovery: requested {requested}, unencumbered {available}")]
    InvalidRecovery { requested: String, available: String },

    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    #[error("Invalid fee parameters: {0}")]
    InvalidFeeParams(#[from] FeeError),

    #[error("Invalid claim period: {seconds}s")]
    InvalidClaimPeriod { seconds: i64 },

    #[error("Operation {operation} does not accept attached value")]
    NonPayable { operation: &'static str },

    #[error("Incompatible storage layout: expected v{expected}, found v{found}")]
    IncompatibleLayout { expected: u32, found: u32 },

    #[error("Storage encoding failed: {0}")]
    Storage(String),

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Transfer failed: {0}")]
    Transfer(#[from] BankError),
}

/// Coarse error classification, stable across message changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    DuplicateVoucher,
    VoucherNotFound,
    InsufficientFunds,
    WrongDepositAmount,
    ClaimInProgress,
    NotClaimed,
    ClaimExpired,
    SecretMismatch,
    Unauthorized,
    InvalidRecovery,
    InvalidInput,
    Storage,
    Overflow,
    Transfer,
}

impl VoucherError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateVoucher { .. } => ErrorKind::DuplicateVoucher,
            Self::VoucherNotFound { .. } => ErrorKind::VoucherNotFound,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::WrongDepositAmount { .. } => ErrorKind::WrongDepositAmount,
            Self::ClaimInProgress { .. } => ErrorKind::ClaimInProgress,
            Self::NotClaimed => ErrorKind::NotClaimed,
            Self::ClaimExpired { .. } => ErrorKind::ClaimExpired,
            Self::SecretMismatch => ErrorKind::SecretMismatch,
            Self::Unauthorized | Self::ReservedCaller { .. } => ErrorKind::Unauthorized,
            Self::InvalidRecovery { .. } => ErrorKind::InvalidRecovery,
            Self::InvalidAmount(_)
            | Self::InvalidFeeParams(_)
            | Self::InvalidClaimPeriod { .. }
            | Self::NonPayable { .. } => ErrorKind::InvalidInput,
            Self::IncompatibleLayout { .. } | Self::Storage(_) => ErrorKind::Storage,
            Self::Overflow => ErrorKind::Overflow,
            Self::Transfer(_) => ErrorKind::Transfer,
        }
    }

    /// Whether the same call can succeed later without changing its inputs.
    ///
    /// Only contention over an active claim resolves by itself, once the
    /// window lapses.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ClaimInProgress { .. })
    }
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Address field {field} must not be empty")]
    EmptyAddress { field: &'static str },

    #[error("Claim period must be positive, got {seconds}s")]
    InvalidClaimPeriod { seconds: i64 },

    #[error("Invalid fee parameters: {0}")]
    InvalidFeeParams(#[from] FeeError),
}
