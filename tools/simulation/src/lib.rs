//! Voucher Ledger Simulation Framework
//!
//! Drives the voucher ledger with seeded adversarial actors and checks the
//! ledger's global invariants after every step. Runs are deterministic in
//! their seeds.
//!
//! # Modules
//! - `engine`: world (bank, ledger, clock) and invariant checking
//! - `actors`: creator, honest redeemer, griefer and secret guesser
//! - `scenarios`: claim race, expiry churn and fee floor
//! - `metrics`: operation, rejection and currency counters
//! - `export`: scenario report JSON export

pub mod engine;
pub mod actors;
pub mod scenarios;
pub mod metrics;
pub mod export;

/// Crate version constant
pub const VERSION: &str = "1.0.0";
