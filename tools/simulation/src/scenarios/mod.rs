//! Scenario simulation modules
//!
//! Each scenario drives a fresh world through one adversarial pattern and
//! reports whether the ledger's guarantees held.

pub mod claim_race;
pub mod expiry_churn;
pub mod fee_floor;

use serde::{Deserialize, Serialize};

use crate::actors::Actor;
use crate::engine::{Action, SimError, StepOutcome, World};
use crate::metrics::SimMetrics;

/// Result of a scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub steps_run: u64,
    pub events_emitted: usize,
    pub passed: bool,
    pub details: String,
    pub metrics: SimMetrics,
}

impl ScenarioResult {
    fn new(name: &str, world: &World, metrics: SimMetrics, failures: Vec<String>) -> Self {
        let passed = failures.is_empty();
        let details = if passed {
            metrics.summary()
        } else {
            failures.join("; ")
        };
        Self {
            name: name.to_string(),
            steps_run: world.steps(),
            events_emitted: world.events().len(),
            passed,
            details,
            metrics,
        }
    }
}

/// Apply an action and record its outcome.
fn apply(
    world: &mut World,
    metrics: &mut SimMetrics,
    action: &Action,
) -> Result<StepOutcome, SimError> {
    let outcome = world.step(action)?;
    metrics.record_outcome(&outcome);
    Ok(outcome)
}

/// Tick an actor and record its outcome, if it acted.
fn tick(
    actor: &mut dyn Actor,
    world: &mut World,
    metrics: &mut SimMetrics,
) -> Result<Option<StepOutcome>, SimError> {
    let outcome = actor.tick(world)?;
    if let Some(outcome) = &outcome {
        metrics.record_outcome(outcome);
    }
    Ok(outcome)
}
