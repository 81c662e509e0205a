//! Identifier types for protocol entities
//!
//! Voucher identifiers are content-derived (`hash(code)`) so every caller
//! computes the same key from the same code. Receipts use UUID v7 for
//! time-sortable ordering of redemptions.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use uuid::Uuid;

use crate::digest::{self, Hash32};

/// Identifier of a voucher slot
///
/// Always `hash(code)`. There is no other derivation rule: creation hashes the
/// raw code, and every later operation is keyed by the resulting identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoucherId(Hash32);

impl VoucherId {
    /// Derive the identifier for a voucher code
    pub fn from_code(code: &[u8]) -> Self {
        Self(digest::hash(code))
    }

    /// Wrap an already-derived digest
    pub fn from_digest(digest: Hash32) -> Self {
        Self(digest)
    }

    /// Parse a hex-encoded identifier (optional `0x` prefix)
    pub fn from_hex(s: &str) -> Option<Self> {
        digest::from_hex(s).map(Self)
    }

    /// Get inner digest
    pub fn as_bytes(&self) -> &Hash32 {
        &self.0
    }

    /// Abbreviated form for log lines
    pub fn short(&self) -> String {
        digest::to_hex(&self.0[..4])
    }
}

impl fmt::Display for VoucherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", digest::to_hex(&self.0))
    }
}

/// Unique identifier for a redemption receipt
///
/// Uses UUID v7 so receipts sort in redemption order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReceiptId(Uuid);

impl ReceiptId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ReceiptId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReceiptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a ledger participant (caller, fee recipient, contract account)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the identity string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Lets balance maps keyed by Address be queried with a plain &str.
impl Borrow<str> for Address {
    fn borrow(&self) -> &str {
        &self.0
    }
}
