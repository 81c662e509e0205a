//! Hash primitive
//!
//! One deterministic `hash(bytes) -> [u8; 32]` is used for both secret
//! commitments and voucher identifiers, so commitment time and verification
//! time can never disagree on the function.

use sha2::{Digest, Sha256};

/// Size of every digest in the protocol.
pub const DIGEST_LEN: usize = 32;

/// Raw 32-byte digest.
pub type Hash32 = [u8; DIGEST_LEN];

/// SHA-256 of arbitrary data.
pub fn hash(data: &[u8]) -> Hash32 {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compare two digests without short-circuiting on the first differing byte.
pub fn digest_eq(a: &Hash32, b: &Hash32) -> bool {
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Lowercase hex rendering.
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Parse a 64-character hex string, with or without `0x`, into a digest.
pub fn from_hex(s: &str) -> Option<Hash32> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let mut out = [0u8; DIGEST_LEN];
    hex::decode_to_slice(s, &mut out).ok()?;
    Some(out)
}
