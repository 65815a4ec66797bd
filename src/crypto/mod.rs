//! # Cryptographic Core
//!
//! The primitive layer the keychain and attestation protocols are built on.
//!
//! Everything here is a thin, typed layer over audited implementations:
//! group operations from `curve25519-dalek`, signing and verification from
//! `ed25519-dalek`, hashing from `blake3` and `sha2`. The one piece of
//! actual protocol in this module is the additive key algebra in
//! [`algebra`]; the rest is plumbing that keeps scalars reduced, points
//! validated, and secrets out of `Debug` output.

pub mod algebra;
pub mod hash;
pub mod material;
pub mod signing;

// Re-export the everyday surface so callers don't need to memorize the
// module hierarchy.
pub use algebra::{
    add, generate_keypair, random_keypair, random_keypair_with, random_seed, reduce_scalar, tweak,
};
pub use material::{KeyError, KeyMaterial, PublicKey, Signer};
pub use signing::{agree, sign_with_scalar, verify_detached};
