//! Types library for the voucher escrow protocol
//!
//! This library provides the core value types shared by the ledger contract and
//! the simulation tooling, so both sides agree on identifiers, hashing and
//! amount arithmetic.
//!
//! # Version
//! v1.0.0 - Storage-layout stable
//!
//! # Modules
//! - `ids`: Identifiers (VoucherId, ReceiptId, Address)
//! - `digest`: The 32-byte hash primitive and hex rendering
//! - `amount`: Fixed-point amount validation and rounding
//! - `fee`: Creation fee and reclaim bonus arithmetic
//! - `time`: Ledger timestamps
//! - `errors`: Error taxonomy

// Public modules
pub mod ids;
pub mod digest;
pub mod amount;
pub mod fee;
pub mod time;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::digest::*;
    pub use crate::amount::*;
    pub use crate::fee::*;
    pub use crate::time::*;
    pub use crate::errors::*;
}
