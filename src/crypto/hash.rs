//! # Hashing Utilities
//!
//! Domain-separated BLAKE3 derivation used by the tweak and signing layers.
//!
//! Every hash in this crate goes through BLAKE3's `derive_key` mode with a
//! fixed context string from [`crate::config`]. Outputs under different
//! contexts can never collide, so the tweak derivation and the signing nonce
//! derivation live in disjoint output spaces even when fed identical input.

use crate::config::{NONCE_CONTEXT, TWEAK_CONTEXT};

/// Hash a sequence of byte slices under a derive_key context.
///
/// Feeding the parts sequentially into the hasher produces the same digest as
/// hashing their concatenation, without the temporary buffer.
pub fn derive_seed(context: &str, parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    for part in parts {
        hasher.update(part);
    }
    *hasher.finalize().as_bytes()
}

/// Derive a 32-byte tweak keypair seed from context bytes.
///
/// One-way and deterministic: the same parts always produce the same seed,
/// and the seed reveals nothing about other contexts.
pub fn tweak_seed(parts: &[&[u8]]) -> [u8; 32] {
    derive_seed(TWEAK_CONTEXT, parts)
}

/// Derive the secret nonce prefix for reduced-scalar signing.
///
/// Standard Ed25519 takes this prefix from the upper half of the SHA-512
/// seed expansion. Additively derived keys have no seed, so the prefix is
/// derived from the scalar instead. It must stay secret: anyone who learns
/// it can predict signature nonces.
pub fn nonce_prefix(scalar_bytes: &[u8; 32]) -> [u8; 32] {
    derive_seed(NONCE_CONTEXT, &[scalar_bytes])
}
