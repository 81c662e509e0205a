//! Claim race scenario
//!
//! A voucher's secret leaks to several parties who all claim in the same
//! tick. Exactly one claim may land; every rival is turned away with
//! `ClaimInProgress`, cannot redeem despite knowing the secret, and the
//! winner redeems the full escrow.

use rust_decimal::Decimal;
use tracing::info;
use voucher_contracts::commitment::SecretCommitment;
use voucher_contracts::config::LedgerConfig;
use voucher_contracts::errors::ErrorKind;
use voucher_contracts::events::ContractEvent;
use voucher_types::ids::{Address, VoucherId};

use super::{apply, ScenarioResult};
use crate::actors::creator::attached_for;
use crate::engine::{Action, SimError, World};
use crate::metrics::SimMetrics;

/// Configuration for the claim race scenario.
#[derive(Debug, Clone)]
pub struct ClaimRaceConfig {
    /// Parties racing to claim the voucher
    pub contenders: usize,
    pub value: Decimal,
    pub claim_deposit: Decimal,
    pub claim_period_seconds: i64,
}

impl Default for ClaimRaceConfig {
    fn default() -> Self {
        Self {
            contenders: 8,
            value: Decimal::from(2),
            claim_deposit: Decimal::from(60),
            claim_period_seconds: 3_600,
        }
    }
}

/// Run the claim race scenario.
pub fn run(config: &ClaimRaceConfig) -> Result<ScenarioResult, SimError> {
    let ledger_config = LedgerConfig::new("admin")
        .with_fee_recipient("treasury")
        .with_claim_period(config.claim_period_seconds);
    let mut world = World::new(ledger_config)?;
    let mut metrics = SimMetrics::new();
    let mut failures = Vec::new();

    let creator = Address::new("creator");
    let secret = b"leaked-secret".to_vec();
    let code = b"race-voucher".to_vec();
    let voucher_id = VoucherId::from_code(&code);
    let attached = attached_for(config.value, &world.fee_params());
    world.fund(&creator, attached)?;

    let created = apply(
        &mut world,
        &mut metrics,
        &Action::Create {
            creator: creator.clone(),
            code,
            secret_commitment: SecretCommitment::from_secret(&secret),
            attached,
            claim_deposit: config.claim_deposit,
        },
    )?;
    if let Err(e) = created.result {
        failures.push(format!("create rejected: {e}"));
        return Ok(ScenarioResult::new("claim_race", &world, metrics, failures));
    }

    let contenders: Vec<Address> = (0..config.contenders)
        .map(|i| Address::new(format!("contender-{i}")))
        .collect();
    for contender in &contenders {
        world.fund(contender, config.claim_deposit)?;
    }

    // Everyone claims before the clock moves
    let mut winner = None;
    for contender in &contenders {
        let outcome = apply(
            &mut world,
            &mut metrics,
            &Action::Claim {
                caller: contender.clone(),
                voucher_id,
                deposit: config.claim_deposit,
            },
        )?;
        match outcome.error_kind() {
            None if winner.is_none() => winner = Some(contender.clone()),
            None => failures.push(format!("{contender} displaced the claim of {winner:?}")),
            Some(ErrorKind::ClaimInProgress) => {}
            Some(kind) => failures.push(format!("{contender} rejected with {kind:?}")),
        }
    }

    let Some(winner) = winner else {
        failures.push("no contender claimed".to_string());
        return Ok(ScenarioResult::new("claim_race", &world, metrics, failures));
    };

    // Losers know the secret but hold no claim
    for loser in contenders.iter().filter(|c| **c != winner) {
        let outcome = apply(
            &mut world,
            &mut metrics,
            &Action::Redeem {
                caller: loser.clone(),
                voucher_id,
                secret: secret.clone(),
            },
        )?;
        if outcome.error_kind() != Some(ErrorKind::NotClaimed) {
            failures.push(format!("{loser} redeem was {:?}", outcome.error_kind()));
        }
        if world.bank.balance_of(loser.as_str()) != config.claim_deposit {
            failures.push(format!("{loser} lost funds in a rejected claim"));
        }
    }

    let redeemed = apply(
        &mut world,
        &mut metrics,
        &Action::Redeem {
            caller: winner.clone(),
            voucher_id,
            secret,
        },
    )?;
    match &redeemed.result {
        Ok(events) => {
            let payout: Decimal = events
                .iter()
                .filter_map(|e| match e {
                    ContractEvent::VoucherRedeemed(r) => Some(r.payout()),
                    _ => None,
                })
                .sum();
            if payout != config.value + config.claim_deposit {
                failures.push(format!("winner paid {payout}"));
            }
        }
        Err(e) => failures.push(format!("winner redeem rejected: {e}")),
    }
    if world.ledger.escrow_total() != Decimal::ZERO {
        failures.push(format!("escrow left behind: {}", world.ledger.escrow_total()));
    }

    info!(
        contenders = config.contenders,
        winner = %winner,
        rejected = metrics.total_rejections,
        "Claim race finished"
    );
    Ok(ScenarioResult::new("claim_race", &world, metrics, failures))
}
