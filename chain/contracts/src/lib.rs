//! Contract logic for custodial vouchers
//!
//! This crate implements the ledger that escrows voucher value, arbitrates
//! exclusive claims over time-bounded windows, and pays out on commit-reveal
//! redemption.
//!
//! # Modules
//! - `events`: Contract events, one per state change
//! - `errors`: Contract-specific error types
//! - `security`: Single-admin access control
//! - `bank`: Native currency balances and atomic settlement
//! - `commitment`: Secret commitments and storage state roots
//! - `config`: Deployment configuration
//! - `voucher`: Voucher records and derived lifecycle state
//! - `ledger`: The voucher ledger and its operations
//! - `storage`: Versioned storage snapshots
//!
//! # Version
//! v0.1.0

pub mod errors;
pub mod events;
pub mod security;
pub mod bank;
pub mod commitment;
pub mod config;
pub mod voucher;
pub mod ledger;
pub mod storage;

/// Contract ABI version, frozen after release
pub const CONTRACT_ABI_VERSION: &str = "1.0.0";

pub use storage::STORAGE_LAYOUT_VERSION;
