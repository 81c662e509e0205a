//! Commitments: secret commit-reveal and storage state roots
//!
//! A voucher is bound at creation to `hash(secret)`; redemption reveals the
//! secret and the ledger recomputes the hash. The same hash primitive derives
//! voucher identifiers, so both sides of the protocol agree on it.
//!
//! State roots digest a storage snapshot so two deployments (for instance
//! before and after a code upgrade) can prove they hold identical state.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use voucher_types::digest::{self, Hash32};

/// Commitment to a voucher secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretCommitment(Hash32);

impl SecretCommitment {
    /// Commit to a plaintext secret.
    pub fn from_secret(secret: &[u8]) -> Self {
        Self(digest::hash(secret))
    }

    /// Wrap a commitment computed off-ledger.
    pub fn from_digest(digest: Hash32) -> Self {
        Self(digest)
    }

    pub fn as_bytes(&self) -> &Hash32 {
        &self.0
    }

    /// Whether `revealed` opens this commitment.
    pub fn is_opened_by(&self, revealed: &[u8]) -> bool {
        digest::digest_eq(&digest::hash(revealed), &self.0)
    }
}

impl fmt::Display for SecretCommitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", digest::to_hex(&self.0))
    }
}

/// Digest of a storage image, domain-separated by layout version.
pub fn compute_state_root(layout_version: u32, storage_bytes: &[u8]) -> Hash32 {
    let mut hasher = Sha256::new();
    hasher.update(b"voucher-ledger/state");
    hasher.update(layout_version.to_be_bytes());
    hasher.update(storage_bytes);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commitment_opened_by_secret() {
        let commitment = SecretCommitment::from_secret(b"CryptoVoucherTesting!");
        assert!(commitment.is_opened_by(b"CryptoVoucherTesting!"));
    }

    #[test]
    fn test_commitment_rejects_other_secret() {
        let commitment = SecretCommitment::from_secret(b"S");
        assert!(!commitment.is_opened_by(b"s"));
        assert!(!commitment.is_opened_by(b""));
    }

    #[test]
    fn test_commitment_does_not_open_with_its_own_hash() {
        // Revealing the commitment itself is not knowledge of the secret
        let commitment = SecretCommitment::from_secret(b"S");
        assert!(!commitment.is_opened_by(commitment.as_bytes()));
    }

    #[test]
    fn test_commitment_from_digest_matches() {
        let off_ledger = digest::hash(b"S");
        assert_eq!(
            SecretCommitment::from_digest(off_ledger),
            SecretCommitment::from_secret(b"S")
        );
    }

    #[test]
    fn test_state_root_deterministic() {
        let r1 = compute_state_root(1, b"storage");
        let r2 = compute_state_root(1, b"storage");
        assert_eq!(r1, r2);
        assert_ne!(r1, compute_state_root(1, b"storage2"));
        assert_ne!(r1, compute_state_root(2, b"storage"));
    }
}
