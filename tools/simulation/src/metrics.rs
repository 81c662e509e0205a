//! Simulation metrics
//!
//! Tallies operations, rejections by kind, and the currency each event moved.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use voucher_contracts::errors::ErrorKind;
use voucher_contracts::events::ContractEvent;
use voucher_types::ids::VoucherId;

use crate::engine::StepOutcome;

/// Aggregated simulation metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimMetrics {
    pub total_steps: u64,
    pub total_creates: u64,
    pub total_claims: u64,
    pub total_forfeits: u64,
    pub total_redemptions: u64,
    pub total_rejections: u64,
    pub rejections_by_kind: BTreeMap<ErrorKind, u64>,
    pub total_fees: Decimal,
    /// Reclaim bonus credited to vouchers
    pub total_credited: Decimal,
    /// Forfeited deposit shares paid to the fee recipient
    pub total_retained: Decimal,
    pub total_paid_out: Decimal,
    pub total_bonus_paid: Decimal,
    /// Most claims any single voucher saw before redemption
    pub max_claims_per_voucher: u64,
    #[serde(skip)]
    claims_per_voucher: HashMap<VoucherId, u64>,
}

impl SimMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one applied action.
    pub fn record_outcome(&mut self, outcome: &StepOutcome) {
        self.total_steps += 1;
        match &outcome.result {
            Ok(events) => self.ingest_events(events),
            Err(e) => {
                self.total_rejections += 1;
                *self.rejections_by_kind.entry(e.kind()).or_insert(0) += 1;
            }
        }
    }

    /// Record a single event into metrics.
    pub fn record_event(&mut self, event: &ContractEvent) {
        match event {
            ContractEvent::VoucherCreated(e) => {
                self.total_creates += 1;
                self.total_fees += e.fee;
            }
            ContractEvent::RedemptionClaimed(e) => {
                self.total_claims += 1;
                let count = self.claims_per_voucher.entry(e.voucher_id).or_insert(0);
                *count += 1;
                self.max_claims_per_voucher = self.max_claims_per_voucher.max(*count);
            }
            ContractEvent::ClaimForfeited(e) => {
                self.total_forfeits += 1;
                self.total_credited += e.credit;
                self.total_retained += e.retained;
            }
            ContractEvent::VoucherRedeemed(e) => {
                self.total_redemptions += 1;
                self.total_paid_out += e.payout();
                self.total_bonus_paid += e.bonus;
                self.claims_per_voucher.remove(&e.voucher_id);
            }
            _ => {}
        }
    }

    pub fn ingest_events(&mut self, events: &[ContractEvent]) {
        for event in events {
            self.record_event(event);
        }
    }

    pub fn rejections(&self, kind: ErrorKind) -> u64 {
        self.rejections_by_kind.get(&kind).copied().unwrap_or(0)
    }

    /// Share of steps the ledger rejected.
    pub fn rejection_rate(&self) -> f64 {
        if self.total_steps == 0 {
            return 0.0;
        }
        self.total_rejections as f64 / self.total_steps as f64
    }

    /// Build a summary string.
    pub fn summary(&self) -> String {
        format!(
            "Steps: {} | Creates: {} | Claims: {} | Forfeits: {} | Redemptions: {} | Rejected: {} ({:.1}%) | Fees: {} | Paid out: {}",
            self.total_steps,
            self.total_creates,
            self.total_claims,
            self.total_forfeits,
            self.total_redemptions,
            self.total_rejections,
            self.rejection_rate() * 100.0,
            self.total_fees,
            self.total_paid_out,
        )
    }
}
