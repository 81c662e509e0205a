//! Honest redeemer
//!
//! Knows the secrets of the vouchers handed to it. Claims a voucher when no
//! one else holds an active claim, redeems while its own claim is live, and
//! waits out anyone else's window.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use voucher_contracts::events::ContractEvent;
use voucher_types::ids::{Address, VoucherId};

use super::creator::IssuedVoucher;
use super::Actor;
use crate::engine::{Action, StepOutcome, World};

pub struct Redeemer {
    pub address: Address,
    /// Probability of acting on a given tick (0.0 to 1.0)
    pub activity: f64,
    pub redeemed: usize,
    pub total_received: Decimal,
    secrets: BTreeMap<VoucherId, Vec<u8>>,
    rng: ChaCha8Rng,
}

impl Redeemer {
    pub fn new(address: Address, activity: f64, seed: u64) -> Self {
        Self {
            address,
            activity,
            redeemed: 0,
            total_received: Decimal::ZERO,
            secrets: BTreeMap::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Receive the secret for a voucher.
    pub fn learn(&mut self, voucher: &IssuedVoucher) {
        self.secrets.insert(voucher.voucher_id, voucher.secret.clone());
    }

    /// Vouchers this redeemer can still redeem.
    pub fn pending(&self) -> usize {
        self.secrets.len()
    }

    fn plan(&self, world: &World, voucher_id: &VoucherId, secret: &[u8]) -> Option<Action> {
        let voucher = world.ledger.get_voucher(voucher_id)?;
        match voucher.active_claim(world.now) {
            Some(claim) if claim.claimant == self.address => Some(Action::Redeem {
                caller: self.address.clone(),
                voucher_id: *voucher_id,
                secret: secret.to_vec(),
            }),
            Some(_) => None,
            None => Some(Action::Claim {
                caller: self.address.clone(),
                voucher_id: *voucher_id,
                deposit: voucher.claim_deposit,
            }),
        }
    }
}

impl Actor for Redeemer {
    fn address(&self) -> &Address {
        &self.address
    }

    fn next_action(&mut self, world: &World) -> Option<Action> {
        // Someone else redeemed or the slot was never created
        self.secrets
            .retain(|id, _| world.ledger.get_voucher(id).is_some());
        if self.secrets.is_empty() || !self.rng.gen_bool(self.activity) {
            return None;
        }

        // Rotate the starting point so no voucher starves
        let start = self.rng.gen_range(0..self.secrets.len());
        let ids: Vec<(&VoucherId, &Vec<u8>)> = self.secrets.iter().collect();
        (0..ids.len())
            .map(|i| ids[(start + i) % ids.len()])
            .find_map(|(id, secret)| self.plan(world, id, secret))
    }

    fn observe(&mut self, action: &Action, outcome: &StepOutcome) {
        let Action::Redeem { voucher_id, .. } = action else {
            return;
        };
        if let Ok(events) = &outcome.result {
            self.redeemed += 1;
            self.secrets.remove(voucher_id);
            for event in events {
                if let ContractEvent::VoucherRedeemed(e) = event {
                    self.total_received += e.payout();
                }
            }
        }
    }
}
