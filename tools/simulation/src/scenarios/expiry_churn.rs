//! Expiry churn scenario
//!
//! A creator issues vouchers to an honest redeemer while griefers claim them
//! with no intention of redeeming and a guesser claims them to try random
//! secrets. Every hostile claim must lapse, forfeit its deposit and grow the
//! voucher's bonus by exactly 20% of that deposit. Once the hostile actors
//! stop, the redeemer must collect every voucher.

use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{info, warn};
use voucher_contracts::config::LedgerConfig;
use voucher_contracts::events::ContractEvent;
use voucher_types::fee::split_forfeited_deposit;
use voucher_types::ids::{Address, VoucherId};

use super::{apply, tick, ScenarioResult};
use crate::actors::creator::{Creator, CreatorConfig};
use crate::actors::griefer::Griefer;
use crate::actors::guesser::Guesser;
use crate::actors::redeemer::Redeemer;
use crate::engine::{Action, SimError, World};
use crate::metrics::SimMetrics;

/// Configuration for the expiry churn scenario.
#[derive(Debug, Clone)]
pub struct ExpiryChurnConfig {
    pub seed: u64,
    /// Ticks with every actor active
    pub ticks: u64,
    /// Ticks the redeemer gets alone afterwards
    pub drain_ticks: u64,
    pub tick_seconds: i64,
    pub claim_period_seconds: i64,
    pub griefers: usize,
    pub griefer_aggression: f64,
    pub guesser_activity: f64,
    pub redeemer_activity: f64,
    /// Creator stops after issuing this many vouchers
    pub max_vouchers: usize,
    pub creator: CreatorConfig,
    /// Starting balance of every actor
    pub starting_balance: Decimal,
}

impl Default for ExpiryChurnConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            ticks: 200,
            drain_ticks: 2_000,
            tick_seconds: 600,
            claim_period_seconds: 3_600,
            griefers: 3,
            griefer_aggression: 0.6,
            guesser_activity: 0.5,
            redeemer_activity: 0.3,
            max_vouchers: 25,
            creator: CreatorConfig::default(),
            starting_balance: Decimal::from(1_000_000),
        }
    }
}

/// Run the expiry churn scenario.
pub fn run(config: &ExpiryChurnConfig) -> Result<ScenarioResult, SimError> {
    let ledger_config = LedgerConfig::new("admin")
        .with_fee_recipient("treasury")
        .with_claim_period(config.claim_period_seconds);
    let mut world = World::new(ledger_config)?;
    let mut metrics = SimMetrics::new();
    let mut failures = Vec::new();

    let mut creator = Creator::new(Address::new("creator"), config.creator.clone(), config.seed);
    let mut redeemer = Redeemer::new(
        Address::new("redeemer"),
        config.redeemer_activity,
        config.seed.wrapping_add(1),
    );
    let mut guesser = Guesser::new(
        Address::new("guesser"),
        config.guesser_activity,
        config.seed.wrapping_add(2),
    );
    let mut griefers: Vec<Griefer> = (0..config.griefers)
        .map(|i| {
            Griefer::new(
                Address::new(format!("griefer-{i}")),
                config.griefer_aggression,
                config.seed.wrapping_add(3 + i as u64),
            )
        })
        .collect();

    let mut funded = vec![
        creator.address.clone(),
        redeemer.address.clone(),
        guesser.address.clone(),
    ];
    funded.extend(griefers.iter().map(|g| g.address.clone()));
    for address in &funded {
        world.fund(address, config.starting_balance)?;
    }

    let advance = Action::Advance {
        seconds: config.tick_seconds,
    };

    for _ in 0..config.ticks {
        if creator.vouchers_issued < config.max_vouchers {
            tick(&mut creator, &mut world, &mut metrics)?;
            for voucher in creator.take_issued() {
                redeemer.learn(&voucher);
            }
        }
        for griefer in griefers.iter_mut() {
            tick(griefer, &mut world, &mut metrics)?;
        }
        tick(&mut guesser, &mut world, &mut metrics)?;
        tick(&mut redeemer, &mut world, &mut metrics)?;
        apply(&mut world, &mut metrics, &advance)?;
    }

    redeemer.activity = 1.0;
    let mut drained = 0;
    while redeemer.pending() > 0 && drained < config.drain_ticks {
        tick(&mut redeemer, &mut world, &mut metrics)?;
        apply(&mut world, &mut metrics, &advance)?;
        drained += 1;
    }

    if redeemer.pending() > 0 || !world.live_voucher_ids().is_empty() {
        failures.push(format!(
            "{} vouchers left unredeemed after {drained} drain ticks",
            redeemer.pending()
        ));
    }
    if metrics.total_redemptions != creator.vouchers_issued as u64 {
        failures.push(format!(
            "issued {} vouchers, redeemed {}",
            creator.vouchers_issued, metrics.total_redemptions
        ));
    }
    if guesser.lucky_guesses > 0 {
        failures.push(format!("guesser redeemed {} vouchers", guesser.lucky_guesses));
    }
    if world.ledger.escrow_total() != Decimal::ZERO {
        failures.push(format!("escrow left behind: {}", world.ledger.escrow_total()));
    }
    failures.extend(check_bonuses(world.events()));

    let griefer_claims: usize = griefers.iter().map(|g| g.claims_placed).sum();
    if !failures.is_empty() {
        warn!(failures = failures.len(), "Expiry churn failed");
    }
    info!(
        seed = config.seed,
        vouchers = creator.vouchers_issued,
        griefer_claims,
        guesses = guesser.guesses,
        forfeits = metrics.total_forfeits,
        drained,
        "Expiry churn finished"
    );
    Ok(ScenarioResult::new("expiry_churn", &world, metrics, failures))
}

/// Verify each redemption's bonus against the deposits its voucher forfeited.
fn check_bonuses(events: &[ContractEvent]) -> Vec<String> {
    let mut failures = Vec::new();
    let mut deposits: HashMap<VoucherId, Decimal> = HashMap::new();
    let mut expected_bonus: HashMap<VoucherId, Decimal> = HashMap::new();

    for event in events {
        match event {
            ContractEvent::VoucherCreated(e) => {
                deposits.insert(e.voucher_id, e.claim_deposit);
                expected_bonus.insert(e.voucher_id, Decimal::ZERO);
            }
            ContractEvent::ClaimForfeited(e) => {
                let deposit = deposits.get(&e.voucher_id).copied().unwrap_or_default();
                match split_forfeited_deposit(deposit) {
                    Ok(split) if split.credit == e.credit && split.retained == e.retained => {}
                    _ => failures.push(format!(
                        "forfeit on {} split {} / {} from deposit {deposit}",
                        e.voucher_id, e.credit, e.retained
                    )),
                }
                *expected_bonus.entry(e.voucher_id).or_default() += e.credit;
            }
            ContractEvent::VoucherRedeemed(e) => {
                let expected = expected_bonus.remove(&e.voucher_id).unwrap_or_default();
                if e.bonus != expected {
                    failures.push(format!(
                        "{} paid bonus {}, forfeits credited {expected}",
                        e.voucher_id, e.bonus
                    ));
                }
            }
            _ => {}
        }
    }
    failures
}
