//! Voucher creator
//!
//! Issues vouchers with random values and claim deposits, and keeps the
//! (code, secret) pairs so a scenario can hand them to a redeemer.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use voucher_contracts::commitment::SecretCommitment;
use voucher_types::fee::FeeParams;
use voucher_types::ids::{Address, VoucherId};

use super::Actor;
use crate::engine::{Action, StepOutcome, World};

/// Configuration for the creator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatorConfig {
    /// Net voucher value range, in hundredths
    pub min_value_cents: i64,
    pub max_value_cents: i64,
    /// Claim deposit range, in whole units
    pub min_deposit: i64,
    pub max_deposit: i64,
    /// Probability of issuing on a given tick (0.0 to 1.0)
    pub issue_probability: f64,
}

impl Default for CreatorConfig {
    fn default() -> Self {
        Self {
            min_value_cents: 1,
            max_value_cents: 10_000,
            min_deposit: 0,
            max_deposit: 100,
            issue_probability: 0.5,
        }
    }
}

/// A voucher this creator issued; the secret is the bearer credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedVoucher {
    pub voucher_id: VoucherId,
    pub code: Vec<u8>,
    pub secret: Vec<u8>,
    pub value: Decimal,
    pub claim_deposit: Decimal,
}

pub struct Creator {
    pub address: Address,
    pub config: CreatorConfig,
    pub vouchers_issued: usize,
    serial: u64,
    pending: Option<IssuedVoucher>,
    issued: Vec<IssuedVoucher>,
    rng: ChaCha8Rng,
}

impl Creator {
    pub fn new(address: Address, config: CreatorConfig, seed: u64) -> Self {
        Self {
            address,
            config,
            vouchers_issued: 0,
            serial: 0,
            pending: None,
            issued: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Draw a fresh voucher and the action that creates it.
    pub fn draft(&mut self, fee_params: &FeeParams) -> Action {
        self.serial += 1;
        let code = format!("{}-{}-{:08x}", self.address, self.serial, self.rng.gen::<u32>()).into_bytes();
        let secret: Vec<u8> = (0..16).map(|_| self.rng.gen()).collect();

        let value = Decimal::new(
            self.rng
                .gen_range(self.config.min_value_cents..=self.config.max_value_cents),
            2,
        );
        let claim_deposit = Decimal::from(
            self.rng
                .gen_range(self.config.min_deposit..=self.config.max_deposit),
        );
        let attached = attached_for(value, fee_params);

        self.pending = Some(IssuedVoucher {
            voucher_id: VoucherId::from_code(&code),
            code: code.clone(),
            secret: secret.clone(),
            value,
            claim_deposit,
        });

        Action::Create {
            creator: self.address.clone(),
            code,
            secret_commitment: SecretCommitment::from_secret(&secret),
            attached,
            claim_deposit,
        }
    }

    /// Hand over every voucher issued since the last call.
    pub fn take_issued(&mut self) -> Vec<IssuedVoucher> {
        std::mem::take(&mut self.issued)
    }
}

impl Actor for Creator {
    fn address(&self) -> &Address {
        &self.address
    }

    fn next_action(&mut self, world: &World) -> Option<Action> {
        if !self.rng.gen_bool(self.config.issue_probability) {
            return None;
        }
        Some(self.draft(&world.fee_params()))
    }

    fn observe(&mut self, action: &Action, outcome: &StepOutcome) {
        if !matches!(action, Action::Create { .. }) {
            return;
        }
        if let Some(voucher) = self.pending.take() {
            if outcome.is_ok() {
                self.vouchers_issued += 1;
                self.issued.push(voucher);
            }
        }
    }
}

/// Amount to attach so the stored value is exactly `value`.
///
/// Below the crossover the flat minimum applies instead of the rate.
pub fn attached_for(value: Decimal, fee_params: &FeeParams) -> Decimal {
    let proportional = value * fee_params.rate();
    value + proportional.max(fee_params.min_creation_fee)
}
