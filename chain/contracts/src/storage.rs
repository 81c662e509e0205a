//! Persistent storage image
//!
//! A snapshot is the complete ledger state minus the event log. The layout is
//! versioned; a ledger only restores snapshots of its own layout, so an
//! upgrade that changes the layout must migrate explicitly.

use serde::{Deserialize, Serialize};
use voucher_types::digest::Hash32;
use voucher_types::fee::FeeParams;
use voucher_types::ids::{Address, VoucherId};

use crate::commitment::compute_state_root;
use crate::errors::VoucherError;
use crate::voucher::VoucherSlot;

/// Current storage layout. Bump on any change to `LedgerSnapshot` encoding.
pub const STORAGE_LAYOUT_VERSION: u32 = 1;

/// One occupied slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotEntry {
    pub voucher_id: VoucherId,
    pub slot: VoucherSlot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub layout_version: u32,
    pub admin: Address,
    pub fee_recipient: Address,
    pub fee_params: FeeParams,
    pub claim_period_seconds: i64,
    pub contract_address: Address,
    pub implementation: String,
    /// Sorted by voucher identifier
    pub slots: Vec<SlotEntry>,
}

impl LedgerSnapshot {
    pub fn to_json(&self) -> Result<String, VoucherError> {
        serde_json::to_string(self).map_err(|e| VoucherError::Storage(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, VoucherError> {
        serde_json::from_str(json).map_err(|e| VoucherError::Storage(e.to_string()))
    }

    /// Digest of the canonical encoding.
    ///
    /// The implementation tag is excluded: an upgrade that leaves storage
    /// untouched keeps the same root.
    pub fn state_root(&self) -> Result<Hash32, VoucherError> {
        let canonical = Self {
            implementation: String::new(),
            ..self.clone()
        };
        let bytes =
            serde_json::to_vec(&canonical).map_err(|e| VoucherError::Storage(e.to_string()))?;
        Ok(compute_state_root(self.layout_version, &bytes))
    }
}
