//! Contract events
//!
//! Events are immutable records emitted by successful ledger operations, one
//! per state change, in ledger order.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use voucher_types::ids::{Address, ReceiptId, VoucherId};
use voucher_types::time::Timestamp;

use crate::commitment::SecretCommitment;

/// Voucher created and value escrowed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherCreated {
    pub voucher_id: VoucherId,
    pub creator: Address,
    pub secret_commitment: SecretCommitment,
    pub value: Decimal,
    pub claim_deposit: Decimal,
    pub fee: Decimal,
    pub created_at: Timestamp,
}

/// Exclusive redemption rights acquired
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionClaimed {
    pub voucher_id: VoucherId,
    pub claimant: Address,
    pub deposit: Decimal,
    pub expires_at: Timestamp,
}

/// Expired claim's deposit forfeited on reclaim
///
/// `credit` stays with the voucher; `retained` went to the fee recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimForfeited {
    pub voucher_id: VoucherId,
    pub previous_claimant: Address,
    pub credit: Decimal,
    pub retained: Decimal,
}

/// Voucher redeemed and deleted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherRedeemed {
    pub voucher_id: VoucherId,
    pub receipt_id: ReceiptId,
    pub redeemer: Address,
    pub value: Decimal,
    pub deposit_refund: Decimal,
    pub bonus: Decimal,
    pub redeemed_at: Timestamp,
}

impl VoucherRedeemed {
    /// Total paid to the redeemer.
    pub fn payout(&self) -> Decimal {
        self.value + self.deposit_refund + self.bonus
    }
}

/// Stray (unescrowed) funds swept by the admin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrayFundsRecovered {
    pub to: Address,
    pub amount: Decimal,
}

/// Enum wrapper for all contract events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractEvent {
    VoucherCreated(VoucherCreated),
    RedemptionClaimed(RedemptionClaimed),
    ClaimForfeited(ClaimForfeited),
    VoucherRedeemed(VoucherRedeemed),
    FeeRecipientUpdated { fee_recipient: Address },
    FeeParamsUpdated {
        min_creation_fee: Decimal,
        creation_fee_rate_bps: u32,
    },
    ClaimPeriodUpdated { claim_period_seconds: i64 },
    StrayFundsRecovered(StrayFundsRecovered),
    AdminTransferred { previous: Address, admin: Address },
    Upgraded { implementation: String },
}

impl ContractEvent {
    /// Voucher the event concerns, if any.
    pub fn voucher_id(&self) -> Option<VoucherId> {
        match self {
            Self::VoucherCreated(e) => Some(e.voucher_id),
            Self::RedemptionClaimed(e) => Some(e.voucher_id),
            Self::ClaimForfeited(e) => Some(e.voucher_id),
            Self::VoucherRedeemed(e) => Some(e.voucher_id),
            _ => None,
        }
    }

    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::VoucherCreated(_) => "voucher_created",
            Self::RedemptionClaimed(_) => "redemption_claimed",
            Self::ClaimForfeited(_) => "claim_forfeited",
            Self::VoucherRedeemed(_) => "voucher_redeemed",
            Self::FeeRecipientUpdated { .. } => "fee_recipient_updated",
            Self::FeeParamsUpdated { .. } => "fee_params_updated",
            Self::ClaimPeriodUpdated { .. } => "claim_period_updated",
            Self::StrayFundsRecovered(_) => "stray_funds_recovered",
            Self::AdminTransferred { .. } => "admin_transferred",
            Self::Upgraded { .. } => "upgraded",
        }
    }
}
