//! Simulated ledger participants
//!
//! Every actor drives its own seeded RNG, so a run is fully reproducible from
//! its seeds. Actors read the world to decide and act only through
//! `World::step`.

pub mod creator;
pub mod redeemer;
pub mod griefer;
pub mod guesser;

use crate::engine::{Action, SimError, StepOutcome, World};
use voucher_types::ids::Address;

/// A participant that proposes one action per tick.
pub trait Actor {
    fn address(&self) -> &Address;

    /// Next action given the current world, or `None` to sit the tick out.
    fn next_action(&mut self, world: &World) -> Option<Action>;

    /// Learn the outcome of an action this actor proposed.
    fn observe(&mut self, _action: &Action, _outcome: &StepOutcome) {}

    /// Propose, apply and observe.
    fn tick(&mut self, world: &mut World) -> Result<Option<StepOutcome>, SimError> {
        let Some(action) = self.next_action(world) else {
            return Ok(None);
        };
        let outcome = world.step(&action)?;
        self.observe(&action, &outcome);
        Ok(Some(outcome))
    }
}
