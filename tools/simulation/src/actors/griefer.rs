//! Claim griefer
//!
//! Claims vouchers it cannot redeem to lock out honest redeemers, then lets
//! the window lapse. Each lapse costs it the full deposit; a fifth of that
//! ends up paid to whoever redeems the voucher eventually.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use voucher_types::ids::{Address, VoucherId};

use super::Actor;
use crate::engine::{Action, StepOutcome, World};

pub struct Griefer {
    pub address: Address,
    /// Probability of acting on a given tick (0.0 to 1.0)
    pub aggression: f64,
    pub claims_placed: usize,
    rng: ChaCha8Rng,
}

impl Griefer {
    pub fn new(address: Address, aggression: f64, seed: u64) -> Self {
        Self {
            address,
            aggression,
            claims_placed: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Actor for Griefer {
    fn address(&self) -> &Address {
        &self.address
    }

    fn next_action(&mut self, world: &World) -> Option<Action> {
        if !self.rng.gen_bool(self.aggression) {
            return None;
        }
        let balance = world.bank.balance_of(self.address.as_str());
        let targets: Vec<VoucherId> = world
            .live_voucher_ids()
            .into_iter()
            .filter(|id| {
                world.ledger.get_voucher(id).is_some_and(|v| {
                    v.active_claim(world.now).is_none() && v.claim_deposit <= balance
                })
            })
            .collect();

        let voucher_id = *targets.choose(&mut self.rng)?;
        let deposit = world.ledger.get_voucher(&voucher_id)?.claim_deposit;
        Some(Action::Claim {
            caller: self.address.clone(),
            voucher_id,
            deposit,
        })
    }

    fn observe(&mut self, _action: &Action, outcome: &StepOutcome) {
        if outcome.is_ok() {
            self.claims_placed += 1;
        }
    }
}
