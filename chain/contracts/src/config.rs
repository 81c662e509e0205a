//! Ledger configuration
//!
//! Initial values for the admin-mutable settings. After deployment the ledger
//! owns these values and changes them only through admin-gated operations.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use voucher_types::fee::{default_min_creation_fee, FeeParams, DEFAULT_CREATION_FEE_RATE_BPS};
use voucher_types::ids::Address;

use crate::errors::ConfigError;

/// Default claim window (24h).
pub const DEFAULT_CLAIM_PERIOD_SECONDS: i64 = 86_400;

/// Bank account holding the ledger's escrow.
pub const DEFAULT_CONTRACT_ADDRESS: &str = "voucher-ledger";

/// Deployment configuration for a voucher ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Sole administrator
    pub admin: Address,
    /// Receives creation fees and forfeited deposit shares
    pub fee_recipient: Address,
    /// Flat creation fee floor
    pub min_creation_fee: Decimal,
    /// Proportional creation fee on net value, in basis points
    pub creation_fee_rate_bps: u32,
    /// Length of a claim window
    pub claim_period_seconds: i64,
    /// Bank account the ledger escrows into
    pub contract_address: Address,
}

/// On-disk form; every field but `admin` is optional.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LedgerConfigFile {
    admin: Address,
    fee_recipient: Option<Address>,
    min_creation_fee: Option<Decimal>,
    creation_fee_rate_bps: Option<u32>,
    claim_period_seconds: Option<i64>,
    contract_address: Option<Address>,
}

impl LedgerConfig {
    /// Defaults for a fresh deployment; the admin also receives fees.
    pub fn new(admin: impl Into<Address>) -> Self {
        let admin = admin.into();
        Self {
            fee_recipient: admin.clone(),
            admin,
            min_creation_fee: default_min_creation_fee(),
            creation_fee_rate_bps: DEFAULT_CREATION_FEE_RATE_BPS,
            claim_period_seconds: DEFAULT_CLAIM_PERIOD_SECONDS,
            contract_address: Address::new(DEFAULT_CONTRACT_ADDRESS),
        }
    }

    /// Parse from JSON, defaulting omitted fields, and validate.
    ///
    /// Amounts are given as strings (`"0.005"`) to keep them exact.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let file: LedgerConfigFile =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let mut config = Self::new(file.admin);
        if let Some(fee_recipient) = file.fee_recipient {
            config.fee_recipient = fee_recipient;
        }
        if let Some(min_fee) = file.min_creation_fee {
            config.min_creation_fee = min_fee;
        }
        if let Some(rate_bps) = file.creation_fee_rate_bps {
            config.creation_fee_rate_bps = rate_bps;
        }
        if let Some(period) = file.claim_period_seconds {
            config.claim_period_seconds = period;
        }
        if let Some(contract_address) = file.contract_address {
            config.contract_address = contract_address;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_fee_recipient(mut self, fee_recipient: impl Into<Address>) -> Self {
        self.fee_recipient = fee_recipient.into();
        self
    }

    pub fn with_fee_params(mut self, params: FeeParams) -> Self {
        self.min_creation_fee = params.min_creation_fee;
        self.creation_fee_rate_bps = params.creation_fee_rate_bps;
        self
    }

    pub fn with_claim_period(mut self, seconds: i64) -> Self {
        self.claim_period_seconds = seconds;
        self
    }

    /// Creation fee parameters as a value object.
    pub fn fee_params(&self) -> FeeParams {
        FeeParams {
            min_creation_fee: self.min_creation_fee,
            creation_fee_rate_bps: self.creation_fee_rate_bps,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.admin.as_str().is_empty() {
            return Err(ConfigError::EmptyAddress { field: "admin" });
        }
        if self.fee_recipient.as_str().is_empty() {
            return Err(ConfigError::EmptyAddress {
                field: "fee_recipient",
            });
        }
        if self.contract_address.as_str().is_empty() {
            return Err(ConfigError::EmptyAddress {
                field: "contract_address",
            });
        }
        if self.claim_period_seconds <= 0 {
            return Err(ConfigError::InvalidClaimPeriod {
                seconds: self.claim_period_seconds,
            });
        }
        self.fee_params().validate()?;
        Ok(())
    }
}
