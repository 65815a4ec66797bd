//! # Detached Signatures & Key Agreement
//!
//! Reduced-scalar Ed25519 signing, detached verification, and Edwards-curve
//! Diffie-Hellman.
//!
//! ## Signing without a seed
//!
//! Derived keys exist only as `(point, scalar)` pairs, so the usual signing
//! path (which re-expands a seed) is unavailable. Signing instead goes
//! through `ed25519_dalek::hazmat`, feeding the scalar directly along with a
//! deterministic secret nonce prefix derived from it. The resulting
//! signatures are ordinary Ed25519: any standard verifier accepts them given
//! the matching public key, which is what lets a public-only party check
//! signatures from keys it merely derived.

use curve25519_dalek::edwards::CompressedEdwardsY;
use curve25519_dalek::scalar::Scalar;
use ed25519_dalek::hazmat::{raw_sign, ExpandedSecretKey};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use sha2::Sha512;

use crate::config::{SHARED_SECRET_LENGTH, SIGNATURE_LENGTH};
use crate::crypto::hash;
use crate::crypto::material::{KeyError, PublicKey};

/// Sign `message` with a reduced scalar, producing a detached 64-byte
/// Ed25519 signature.
///
/// `public` must be the point generated by `scalar`; it is bound into the
/// challenge hash exactly as in RFC 8032. The nonce prefix is derived
/// deterministically from the scalar, so signatures are repeatable for a
/// given `(scalar, message)` pair.
pub fn sign_with_scalar(
    scalar: &Scalar,
    public: &PublicKey,
    message: &[u8],
) -> Result<[u8; SIGNATURE_LENGTH], KeyError> {
    let verifying =
        VerifyingKey::from_bytes(public.as_bytes()).map_err(|_| KeyError::InvalidPublicKey)?;
    let expanded = ExpandedSecretKey {
        scalar: *scalar,
        hash_prefix: hash::nonce_prefix(&scalar.to_bytes()),
    };
    Ok(raw_sign::<Sha512>(&expanded, message, &verifying).to_bytes())
}

/// Verify a detached signature against a public key.
///
/// Returns `false` for anything that is not a valid signature by the named
/// key over exactly `message`: wrong length, wrong key, non-point key bytes,
/// tampered message. No error oracle.
pub fn verify_detached(public: &PublicKey, message: &[u8], signature: &[u8]) -> bool {
    let Ok(sig_bytes) = <[u8; SIGNATURE_LENGTH]>::try_from(signature) else {
        return false;
    };
    let Ok(verifying) = VerifyingKey::from_bytes(public.as_bytes()) else {
        return false;
    };
    verifying
        .verify(message, &Signature::from_bytes(&sig_bytes))
        .is_ok()
}

/// Diffie-Hellman key agreement on the Edwards curve.
///
/// Computes `scalar * foreign_point` with no cofactor clamping and returns
/// the compressed result. Both parties of an exchange land on the same 32
/// bytes. The output is a raw group element: run it through a KDF before
/// using it as a symmetric key, and never treat it as proof of identity.
pub fn agree(scalar: &Scalar, foreign: &PublicKey) -> Result<[u8; SHARED_SECRET_LENGTH], KeyError> {
    let point = CompressedEdwardsY(foreign.to_bytes())
        .decompress()
        .ok_or(KeyError::InvalidPublicKey)?;
    Ok((point * scalar).compress().to_bytes())
}
