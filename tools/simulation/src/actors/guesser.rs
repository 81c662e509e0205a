//! Secret guesser
//!
//! Claims vouchers and tries random secrets while its window is open. It
//! should never succeed; every attempt costs a lapsed deposit.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use voucher_types::ids::{Address, VoucherId};

use super::Actor;
use crate::engine::{Action, StepOutcome, World};

pub struct Guesser {
    pub address: Address,
    /// Probability of acting on a given tick (0.0 to 1.0)
    pub activity: f64,
    /// Length of each guessed secret
    pub guess_len: usize,
    pub guesses: usize,
    pub lucky_guesses: usize,
    rng: ChaCha8Rng,
}

impl Guesser {
    pub fn new(address: Address, activity: f64, seed: u64) -> Self {
        Self {
            address,
            activity,
            guess_len: 16,
            guesses: 0,
            lucky_guesses: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn held_claim(&self, world: &World) -> Option<VoucherId> {
        world.live_voucher_ids().into_iter().find(|id| {
            world
                .ledger
                .get_voucher(id)
                .and_then(|v| v.active_claim(world.now))
                .is_some_and(|c| c.claimant == self.address)
        })
    }
}

impl Actor for Guesser {
    fn address(&self) -> &Address {
        &self.address
    }

    fn next_action(&mut self, world: &World) -> Option<Action> {
        if !self.rng.gen_bool(self.activity) {
            return None;
        }

        if let Some(voucher_id) = self.held_claim(world) {
            let secret: Vec<u8> = (0..self.guess_len).map(|_| self.rng.gen()).collect();
            return Some(Action::Redeem {
                caller: self.address.clone(),
                voucher_id,
                secret,
            });
        }

        let balance = world.bank.balance_of(self.address.as_str());
        let open: Vec<VoucherId> = world
            .live_voucher_ids()
            .into_iter()
            .filter(|id| {
                world.ledger.get_voucher(id).is_some_and(|v| {
                    v.active_claim(world.now).is_none() && v.claim_deposit <= balance
                })
            })
            .collect();
        let voucher_id = *open.choose(&mut self.rng)?;
        let deposit = world.ledger.get_voucher(&voucher_id)?.claim_deposit;
        Some(Action::Claim {
            caller: self.address.clone(),
            voucher_id,
            deposit,
        })
    }

    fn observe(&mut self, action: &Action, outcome: &StepOutcome) {
        if let Action::Redeem { .. } = action {
            self.guesses += 1;
            if outcome.is_ok() {
                self.lucky_guesses += 1;
            }
        }
    }
}
