//! Voucher records and their derived lifecycle state
//!
//! A slot is either live or redeemed; a key with no slot was never created.
//! Claim expiry is never stored: it is recomputed from `now` by whoever reads
//! the record.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use voucher_types::ids::{Address, ReceiptId};
use voucher_types::time::{self, Timestamp};

use crate::commitment::SecretCommitment;

/// Exclusive, time-bounded redemption rights over a voucher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub claimant: Address,
    /// Deposit escrowed for this claim
    pub deposit: Decimal,
    pub claimed_at: Timestamp,
    pub expires_at: Timestamp,
}

impl Claim {
    pub fn is_active(&self, now: Timestamp) -> bool {
        !time::is_lapsed(now, self.expires_at)
    }
}

/// A live voucher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voucher {
    pub creator: Address,
    pub secret_commitment: SecretCommitment,
    /// Owed to the eventual redeemer
    pub value: Decimal,
    /// Exact deposit a claimant must attach
    pub claim_deposit: Decimal,
    /// Most recent claim, active or lapsed
    pub claim: Option<Claim>,
    /// Reclaim bonuses accumulated from lapsed claims
    pub forfeited_deposit_credit: Decimal,
    pub created_at: Timestamp,
    /// Number of claims ever placed
    pub claim_count: u32,
}

impl Voucher {
    pub fn claimed_by(&self) -> Option<&Address> {
        self.claim.as_ref().map(|c| &c.claimant)
    }

    pub fn claim_expires_at(&self) -> Option<Timestamp> {
        self.claim.as_ref().map(|c| c.expires_at)
    }

    /// The claim, if it has not lapsed at `now`.
    pub fn active_claim(&self, now: Timestamp) -> Option<&Claim> {
        self.claim.as_ref().filter(|c| c.is_active(now))
    }

    /// Deposit held in escrow for the most recent claim.
    ///
    /// A lapsed claim's deposit stays locked until the next claim forfeits it.
    pub fn locked_deposit(&self) -> Decimal {
        self.claim
            .as_ref()
            .map(|c| c.deposit)
            .unwrap_or(Decimal::ZERO)
    }

    /// Everything the ledger holds on behalf of this voucher.
    pub fn escrowed(&self) -> Decimal {
        self.value + self.locked_deposit() + self.forfeited_deposit_credit
    }

    /// Lifecycle state at `now`.
    pub fn status(&self, now: Timestamp) -> VoucherStatus {
        match &self.claim {
            None => VoucherStatus::Unclaimed,
            Some(c) if c.is_active(now) => VoucherStatus::Claimed {
                claimant: c.claimant.clone(),
                expires_at: c.expires_at,
            },
            Some(c) => VoucherStatus::Expired {
                claimant: c.claimant.clone(),
                expired_at: c.expires_at,
            },
        }
    }
}

/// Proof of a completed redemption, kept in place of the deleted voucher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionReceipt {
    pub receipt_id: ReceiptId,
    pub redeemer: Address,
    pub payout: Decimal,
    pub redeemed_at: Timestamp,
}

/// Storage slot under a voucher identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum VoucherSlot {
    Live(Voucher),
    Redeemed(RedemptionReceipt),
}

/// Externally visible lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoucherStatus {
    /// Never created
    Absent,
    Unclaimed,
    Claimed {
        claimant: Address,
        expires_at: Timestamp,
    },
    /// Claim lapsed without redemption; fields unchanged until the next claim
    Expired {
        claimant: Address,
        expired_at: Timestamp,
    },
    Redeemed {
        receipt_id: ReceiptId,
    },
}
