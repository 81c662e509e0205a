//! Access control for administrative operations
//!
//! The ledger has exactly one administrator. Fee configuration, claim period,
//! stray fund recovery, admin transfer and code upgrades are gated on it.

use serde::{Deserialize, Serialize};
use tracing::warn;
use voucher_types::ids::Address;

use crate::errors::VoucherError;

/// Single-admin access control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControl {
    admin: Address,
}

impl AccessControl {
    /// Create access control with an initial admin.
    pub fn new(admin: impl Into<Address>) -> Self {
        Self {
            admin: admin.into(),
        }
    }

    /// Check if a caller is admin.
    pub fn is_admin(&self, caller: &str) -> bool {
        self.admin.as_str() == caller
    }

    /// Reject any caller other than the admin.
    pub fn ensure_admin(&self, caller: &str, operation: &'static str) -> Result<(), VoucherError> {
        if !self.is_admin(caller) {
            warn!(caller, operation, "Unauthorized admin call rejected");
            return Err(VoucherError::Unauthorized);
        }
        Ok(())
    }

    /// Transfer admin to a new identity.
    pub fn transfer_admin(&mut self, current_admin: &str, new_admin: impl Into<Address>) -> bool {
        if !self.is_admin(current_admin) {
            return false;
        }
        self.admin = new_admin.into();
        true
    }

    /// Get the current admin identifier.
    pub fn admin(&self) -> &Address {
        &self.admin
    }
}
