//! Fee floor scenario
//!
//! Creates vouchers from attached amounts straddling the point where the
//! proportional fee overtakes the flat minimum. Below it the fee is exactly
//! the minimum; above it the stored value is the attached amount divided by
//! `1 + rate`; at or under the minimum itself the create is rejected.

use rust_decimal::Decimal;
use tracing::info;
use voucher_contracts::commitment::SecretCommitment;
use voucher_contracts::config::LedgerConfig;
use voucher_contracts::errors::ErrorKind;
use voucher_contracts::events::ContractEvent;
use voucher_types::amount;
use voucher_types::fee::FeeParams;
use voucher_types::ids::Address;

use super::{apply, ScenarioResult};
use crate::actors::creator::attached_for;
use crate::engine::{Action, SimError, World};
use crate::metrics::SimMetrics;

/// Configuration for the fee floor scenario.
#[derive(Debug, Clone)]
pub struct FeeFloorConfig {
    pub fee_params: FeeParams,
    /// Attached amounts as multiples of the crossover point
    pub probes: Vec<Decimal>,
    /// Net values to gross up and create exactly
    pub target_values: Vec<Decimal>,
}

impl Default for FeeFloorConfig {
    fn default() -> Self {
        Self {
            fee_params: FeeParams::default(),
            probes: [
                "0", "0.001", "0.0196", "0.0197", "0.5", "0.99", "1", "1.01", "2", "10", "1000",
            ]
            .iter()
            .filter_map(|s| Decimal::from_str_exact(s).ok())
            .collect(),
            target_values: ["0.01", "0.2", "0.25", "0.26", "2", "1234.56"]
                .iter()
                .filter_map(|s| Decimal::from_str_exact(s).ok())
                .collect(),
        }
    }
}

/// Attached amount at which `attached · rate / (1 + rate)` equals the minimum.
pub fn crossover(fee_params: &FeeParams) -> Option<Decimal> {
    let rate = fee_params.rate();
    if rate.is_zero() {
        return None;
    }
    fee_params
        .min_creation_fee
        .checked_mul(Decimal::ONE + rate)?
        .checked_div(rate)
}

/// Run the fee floor scenario.
pub fn run(config: &FeeFloorConfig) -> Result<ScenarioResult, SimError> {
    let params = &config.fee_params;
    let ledger_config = LedgerConfig::new("admin")
        .with_fee_recipient("treasury")
        .with_fee_params(params.clone());
    let mut world = World::new(ledger_config)?;
    let mut metrics = SimMetrics::new();
    let mut failures = Vec::new();

    let creator = Address::new("creator");
    world.fund(&creator, Decimal::from(1_000_000))?;
    let crossover = crossover(params);
    let divisor = Decimal::ONE + params.rate();

    let mut serial = 0u32;
    let mut create = |world: &mut World, metrics: &mut SimMetrics, attached: Decimal| {
        serial += 1;
        apply(
            world,
            metrics,
            &Action::Create {
                creator: creator.clone(),
                code: format!("fee-floor-{serial}").into_bytes(),
                secret_commitment: SecretCommitment::from_secret(b"fee-floor"),
                attached,
                claim_deposit: Decimal::ZERO,
            },
        )
    };

    for multiple in &config.probes {
        let attached = match crossover {
            Some(point) => point * *multiple,
            None => *multiple,
        };
        let outcome = create(&mut world, &mut metrics, attached)?;
        let created = outcome.result.as_ref().ok().and_then(|events| {
            events.iter().find_map(|e| match e {
                ContractEvent::VoucherCreated(c) => Some(c.clone()),
                _ => None,
            })
        });

        if attached <= params.min_creation_fee {
            if outcome.error_kind() != Some(ErrorKind::InsufficientFunds) {
                failures.push(format!("attached {attached} was {:?}", outcome.error_kind()));
            }
            continue;
        }
        let Some(created) = created else {
            failures.push(format!("attached {attached} rejected: {:?}", outcome.error_kind()));
            continue;
        };

        if created.value + created.fee != attached {
            failures.push(format!("attached {attached} split into {} + {}", created.value, created.fee));
        }
        let below_crossover = crossover.map_or(true, |point| attached <= point);
        if below_crossover {
            if created.fee != params.min_creation_fee {
                failures.push(format!("attached {attached} charged {} under the floor", created.fee));
            }
        } else if created.value != amount::round_down(attached / divisor) {
            failures.push(format!("attached {attached} stored {}", created.value));
        }
    }

    for value in &config.target_values {
        let attached = attached_for(*value, params);
        let outcome = create(&mut world, &mut metrics, attached)?;
        let stored = outcome.result.as_ref().ok().and_then(|events| {
            events.iter().find_map(|e| match e {
                ContractEvent::VoucherCreated(c) => Some(c.value),
                _ => None,
            })
        });
        if stored != Some(*value) {
            failures.push(format!("target {value} stored {stored:?}"));
        }
    }

    info!(
        crossover = ?crossover,
        probes = config.probes.len(),
        targets = config.target_values.len(),
        fees = %metrics.total_fees,
        "Fee floor finished"
    );
    Ok(ScenarioResult::new("fee_floor", &world, metrics, failures))
}
