//! # Key Material
//!
//! The value types at the heart of keyfold: [`PublicKey`], [`KeyMaterial`],
//! and the [`Signer`] capability.
//!
//! A `KeyMaterial` carries a curve point and, when the holder knows the
//! secret, the matching reduced signing scalar. Unlike a standard Ed25519
//! keypair there is no seed: derived keys exist only as `(point, scalar)`
//! pairs produced by additive composition, which is exactly what makes the
//! derivation tree work on both the public and the secret side.
//!
//! ## Validation boundary
//!
//! Foreign bytes enter through [`KeyMaterial::try_from_slice`] or
//! [`KeyMaterial::from_public`], which check the length and that the bytes
//! decompress to a point on the curve. Everything past that boundary holds an
//! already-decompressed [`EdwardsPoint`], so the group operations in
//! [`crate::crypto::algebra`] are total.
//!
//! ## Security considerations
//!
//! - Scalars never appear in `Debug` output or error messages.
//! - `KeyMaterial` does not implement `Serialize`. Exporting secret material
//!   must be a deliberate act, not a side effect of logging a struct.

use std::fmt;

use curve25519_dalek::edwards::{CompressedEdwardsY, EdwardsPoint};
use curve25519_dalek::scalar::Scalar;
use ed25519_dalek::SigningKey;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{PUBLIC_KEY_LENGTH, SHARED_SECRET_LENGTH, SIGNATURE_LENGTH};
use crate::crypto::{algebra, signing};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by key construction and use.
///
/// All of these indicate caller mistakes. None are retryable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    /// A buffer had the wrong length for the key material it claims to be.
    #[error("invalid key length: expected {expected} bytes, got {got}")]
    InvalidKeyLength {
        /// The length the operation required.
        expected: usize,
        /// The length actually supplied.
        got: usize,
    },

    /// 32 bytes that do not decompress to a point on the curve.
    #[error("invalid public key: not a valid Ed25519 point")]
    InvalidPublicKey,

    /// A signature buffer was not exactly 64 bytes.
    #[error("invalid signature length: expected {expected} bytes, got {got}")]
    InvalidSignatureLength {
        /// The required signature length.
        expected: usize,
        /// The length actually supplied.
        got: usize,
    },

    /// Signing or key agreement was attempted with public-only key material.
    #[error("key material holds no secret scalar and cannot sign or agree")]
    NotSignable,
}

// ---------------------------------------------------------------------------
// PublicKey
// ---------------------------------------------------------------------------

/// A 32-byte compressed Edwards public key.
///
/// This is the identity other parties see: what they verify signatures
/// against, what they feed into their own derivation trees, and what an
/// attestation record names as its base. Safe to share, serialize, and log.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey {
    bytes: [u8; PUBLIC_KEY_LENGTH],
}

impl PublicKey {
    /// Wrap raw bytes without validation.
    ///
    /// Use [`KeyMaterial::try_from_slice`] when the bytes come from outside
    /// and need to be checked against the curve.
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self { bytes }
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.bytes
    }

    /// Copy out the raw bytes.
    pub fn to_bytes(self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.bytes
    }

    /// Verify a detached signature against this public key.
    ///
    /// Returns `true` only for a well-formed 64-byte signature that checks
    /// out under ordinary Ed25519 verification. Malformed input is just
    /// `false`; callers get a yes/no answer, not an error oracle.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        signing::verify_detached(self, message, signature)
    }

    /// Hex-encoded representation, 64 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Parse a hex-encoded public key.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s).map_err(|_| KeyError::InvalidPublicKey)?;
        if bytes.len() != PUBLIC_KEY_LENGTH {
            return Err(KeyError::InvalidKeyLength {
                expected: PUBLIC_KEY_LENGTH,
                got: bytes.len(),
            });
        }
        let mut arr = [0u8; PUBLIC_KEY_LENGTH];
        arr.copy_from_slice(&bytes);
        Ok(Self { bytes: arr })
    }

    /// Base58-encoded representation, the compact form for user display.
    pub fn to_base58(&self) -> String {
        bs58::encode(self.bytes).into_string()
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", &self.to_hex()[..16])
    }
}

impl From<[u8; PUBLIC_KEY_LENGTH]> for PublicKey {
    fn from(bytes: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self::from_bytes(bytes)
    }
}

// ---------------------------------------------------------------------------
// KeyMaterial
// ---------------------------------------------------------------------------

/// A curve point with an optional reduced signing scalar.
///
/// Invariant: when the scalar is present, the point equals the scalar times
/// the Ed25519 basepoint. Every constructor and every operation in
/// [`crate::crypto::algebra`] preserves this, so it holds for the root, for
/// every `get`/`sub` derivation, and for attestation-derived keys alike.
///
/// Values are immutable once constructed; derivations allocate new material
/// rather than mutating in place, so sharing across threads needs no locking.
#[derive(Clone)]
pub struct KeyMaterial {
    point: EdwardsPoint,
    public: PublicKey,
    scalar: Option<Scalar>,
}

impl KeyMaterial {
    /// Assemble key material from an already-validated point and scalar.
    ///
    /// Callers are responsible for the point/scalar invariant; this is the
    /// internal constructor used by the algebra layer.
    pub(crate) fn from_parts(point: EdwardsPoint, scalar: Option<Scalar>) -> Self {
        let public = PublicKey::from_bytes(point.compress().to_bytes());
        Self {
            point,
            public,
            scalar,
        }
    }

    /// Public-only key material from a [`PublicKey`].
    ///
    /// Fails with [`KeyError::InvalidPublicKey`] if the bytes do not
    /// decompress to a curve point.
    pub fn from_public(public: PublicKey) -> Result<Self, KeyError> {
        let point = CompressedEdwardsY(public.to_bytes())
            .decompress()
            .ok_or(KeyError::InvalidPublicKey)?;
        Ok(Self {
            point,
            public,
            scalar: None,
        })
    }

    /// Public-only key material from a byte slice.
    ///
    /// Checks the length and curve membership. This is the entry point for
    /// keys received off the wire.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        if slice.len() != PUBLIC_KEY_LENGTH {
            return Err(KeyError::InvalidKeyLength {
                expected: PUBLIC_KEY_LENGTH,
                got: slice.len(),
            });
        }
        let mut bytes = [0u8; PUBLIC_KEY_LENGTH];
        bytes.copy_from_slice(slice);
        Self::from_public(PublicKey::from_bytes(bytes))
    }

    /// Full key material from a standard Ed25519 signing key.
    ///
    /// The reduced signing scalar is extracted from the key's SHA-512 seed
    /// expansion, so material built here composes additively with tweaks.
    pub fn from_signing_key(key: &SigningKey) -> Self {
        let scalar = algebra::signing_scalar(&key.to_bytes());
        Self::from_parts(EdwardsPoint::mul_base(&scalar), Some(scalar))
    }

    /// The public half.
    pub fn public_key(&self) -> PublicKey {
        self.public
    }

    /// Whether a secret scalar is present.
    pub fn has_secret(&self) -> bool {
        self.scalar.is_some()
    }

    /// Copy out the reduced scalar bytes, if present.
    ///
    /// Handle with care: these 32 bytes are the full signing capability of
    /// this key and every key derived beneath it.
    pub fn scalar_bytes(&self) -> Option<[u8; 32]> {
        self.scalar.map(|s| s.to_bytes())
    }

    /// Bind a [`Signer`] to a copy of this material.
    pub fn signer(&self) -> Signer {
        Signer { key: self.clone() }
    }

    pub(crate) fn point(&self) -> EdwardsPoint {
        self.point
    }

    pub(crate) fn scalar(&self) -> Option<&Scalar> {
        self.scalar.as_ref()
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The scalar never appears here, not even partially.
        write!(
            f,
            "KeyMaterial(pub={}, secret={})",
            &self.public.to_hex()[..16],
            if self.has_secret() { "yes" } else { "no" }
        )
    }
}

impl PartialEq for KeyMaterial {
    /// Two values are equal when they name the same public point. Secret
    /// scalars are deliberately not compared.
    fn eq(&self, other: &Self) -> bool {
        self.public == other.public
    }
}

impl Eq for KeyMaterial {}

impl From<&SigningKey> for KeyMaterial {
    fn from(key: &SigningKey) -> Self {
        Self::from_signing_key(key)
    }
}

// ---------------------------------------------------------------------------
// Signer
// ---------------------------------------------------------------------------

/// Capability object bound to one [`KeyMaterial`].
///
/// Verification always works. Signing and key agreement require the secret
/// scalar and fail with [`KeyError::NotSignable`] on public-only material,
/// which is how a verification-only party experiences the same API.
///
/// # Examples
///
/// ```
/// use keyfold::chain::Keychain;
///
/// let signer = Keychain::from_seed(&[7u8; 32]).get("announce");
/// let sig = signer.sign(b"hello").unwrap();
/// assert!(signer.verify(b"hello", &sig));
/// ```
#[derive(Clone)]
pub struct Signer {
    key: KeyMaterial,
}

impl Signer {
    /// The public key this signer is bound to.
    pub fn public_key(&self) -> PublicKey {
        self.key.public_key()
    }

    /// Borrow the underlying key material.
    pub fn key_material(&self) -> &KeyMaterial {
        &self.key
    }

    /// Whether this signer can actually sign.
    pub fn has_secret(&self) -> bool {
        self.key.has_secret()
    }

    /// Produce a detached 64-byte signature over `message`.
    ///
    /// Signatures are deterministic and verify under ordinary Ed25519
    /// verification against [`Self::public_key`].
    pub fn sign(&self, message: &[u8]) -> Result<[u8; SIGNATURE_LENGTH], KeyError> {
        let scalar = self.key.scalar().ok_or(KeyError::NotSignable)?;
        signing::sign_with_scalar(scalar, &self.key.public_key(), message)
    }

    /// Verify a detached signature against this signer's public key.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        self.key.public_key().verify(message, signature)
    }

    /// Diffie-Hellman agreement with a foreign public key.
    ///
    /// Both parties compute the same 32 bytes. The output is suitable as
    /// input to a KDF for confidentiality purposes only; it authenticates
    /// nobody.
    pub fn agree(&self, peer: &PublicKey) -> Result<[u8; SHARED_SECRET_LENGTH], KeyError> {
        let scalar = self.key.scalar().ok_or(KeyError::NotSignable)?;
        signing::agree(scalar, peer)
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Signer(pub={}, secret={})",
            &self.public_key().to_hex()[..16],
            if self.has_secret() { "yes" } else { "no" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::algebra;

    #[test]
    fn public_key_hex_roundtrip() {
        let kp = algebra::generate_keypair(&[1u8; 32]);
        let pk = kp.public_key();
        let recovered = PublicKey::from_hex(&pk.to_hex()).unwrap();
        assert_eq!(pk, recovered);
    }

    #[test]
    fn public_key_encoding_formats() {
        let pk = algebra::generate_keypair(&[2u8; 32]).public_key();
        assert_eq!(pk.to_hex().len(), 64);
        let b58 = pk.to_base58();
        assert!(b58.len() >= 42 && b58.len() <= 46);
    }

    #[test]
    fn try_from_slice_rejects_wrong_length() {
        assert_eq!(
            KeyMaterial::try_from_slice(&[0u8; 16]),
            Err(KeyError::InvalidKeyLength {
                expected: 32,
                got: 16
            })
        );
    }

    #[test]
    fn try_from_slice_rejects_non_points() {
        // Roughly half of all 32-byte strings fail decompression. Scan a few
        // small y-coordinates and check the rejects surface as the right error.
        let rejected = (0u8..64).filter(|&y| {
            let mut bytes = [0u8; 32];
            bytes[0] = y;
            KeyMaterial::try_from_slice(&bytes) == Err(KeyError::InvalidPublicKey)
        });
        assert!(rejected.count() > 0);
    }

    #[test]
    fn public_only_material_cannot_sign_or_agree() {
        let full = algebra::generate_keypair(&[3u8; 32]);
        let public = KeyMaterial::try_from_slice(full.public_key().as_bytes()).unwrap();
        assert!(!public.has_secret());

        let signer = public.signer();
        assert_eq!(signer.sign(b"nope"), Err(KeyError::NotSignable));
        assert_eq!(
            signer.agree(&full.public_key()),
            Err(KeyError::NotSignable)
        );
    }

    #[test]
    fn public_only_signer_still_verifies() {
        let full = algebra::generate_keypair(&[4u8; 32]);
        let sig = full.signer().sign(b"message").unwrap();

        let verifier = KeyMaterial::try_from_slice(full.public_key().as_bytes())
            .unwrap()
            .signer();
        assert!(verifier.verify(b"message", &sig));
        assert!(!verifier.verify(b"other message", &sig));
    }

    #[test]
    fn from_signing_key_matches_dalek_public() {
        let sk = ed25519_dalek::SigningKey::from_bytes(&[5u8; 32]);
        let km = KeyMaterial::from_signing_key(&sk);
        assert_eq!(km.public_key().as_bytes(), &sk.verifying_key().to_bytes());
        assert!(km.has_secret());
    }

    #[test]
    fn debug_output_never_contains_scalar() {
        let km = algebra::generate_keypair(&[6u8; 32]);
        let scalar_hex = hex::encode(km.scalar_bytes().unwrap());
        let debug = format!("{:?} {:?}", km, km.signer());
        assert!(!debug.contains(&scalar_hex));
    }

    #[test]
    fn equality_is_by_public_point() {
        let a = algebra::generate_keypair(&[7u8; 32]);
        let public = KeyMaterial::try_from_slice(a.public_key().as_bytes()).unwrap();
        assert_eq!(a, public);
    }
}
