//! # Protocol Constants
//!
//! Every fixed length and derivation context in keyfold lives here. If you're
//! hardcoding a `32` somewhere else in this crate, you're doing it wrong.
//!
//! The derivation context strings are consensus-critical for anyone exchanging
//! derived keys or attestations with this implementation: changing them changes
//! every tweak, every derived public key, and every attestation ever produced.

// ---------------------------------------------------------------------------
// Key Material Lengths
// ---------------------------------------------------------------------------

/// Compressed Edwards public key length. Ed25519 public keys are 32 bytes.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Reduced signing scalar length.
pub const SCALAR_LENGTH: usize = 32;

/// Seed length for deterministic keypair generation.
pub const SEED_LENGTH: usize = 32;

/// Length of a libsodium-style expanded secret key (seed followed by the
/// public key). Accepted as a foreign input format by scalar extraction.
pub const SECRET_KEY_LENGTH: usize = 64;

/// Detached Ed25519 signature length. Always 64 bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// Length of the shared secret produced by key agreement.
pub const SHARED_SECRET_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Attestation Record Layout
// ---------------------------------------------------------------------------

/// Width of the metadata length prefix in an attestation record: a `u32` in
/// little-endian byte order.
pub const METADATA_PREFIX_LENGTH: usize = 4;

/// Fixed overhead of an encoded attest record: base public key, metadata
/// length prefix, and signature. Total record size is this plus the metadata.
pub const ATTEST_OVERHEAD: usize = PUBLIC_KEY_LENGTH + METADATA_PREFIX_LENGTH + SIGNATURE_LENGTH;

// ---------------------------------------------------------------------------
// Derivation Contexts
// ---------------------------------------------------------------------------
//
// BLAKE3 derive_key context strings. Each distinct use of the hash gets its
// own context so outputs from one can never collide with another.

/// Context for deriving tweak keypair seeds from caller-supplied bytes.
pub const TWEAK_CONTEXT: &str = "keyfold v1 tweak keypair seed";

/// Context for deriving the secret nonce prefix used by reduced-scalar
/// signing. The input is the signing scalar itself, so the output is secret.
pub const NONCE_CONTEXT: &str = "keyfold v1 signing nonce prefix";
