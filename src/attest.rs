//! # Attestations
//!
//! A root authority signs a binding of metadata to a base public key; the
//! signed record is then hashed into a tweak and added onto the base key.
//! The derived key's very existence commits to `(base, metadata, root
//! signature)`: anyone holding the attestation bytes and the root's public
//! key can check that a claimed public key is exactly the base plus the
//! record tweak, and that the root authorized the record.
//!
//! ## Wire format
//!
//! Two records, fixed field order, no version byte:
//!
//! ```text
//! attestable = base:32 || metadata_len:u32-le || metadata
//! attest     = attestable || signature:64
//! ```
//!
//! The encoding is canonical: decode requires the record length to match the
//! length prefix exactly, so a given record has one and only one byte form.
//! That matters because the full attest record doubles as the tweak hash
//! input.
//!
//! ## Example
//!
//! ```
//! use keyfold::attest::{bind_attestation, get_attestable, verify_attestation};
//! use keyfold::chain::Keychain;
//!
//! let root = Keychain::from_seed(&[1u8; 32]);
//! let base = Keychain::from_seed(&[2u8; 32]);
//!
//! let payload = get_attestable(&base, b"can-publish").unwrap();
//! let signature = root.signer().sign(&payload).unwrap();
//!
//! let bound = bind_attestation(&base, b"can-publish", &signature,
//!     Some(&root.public_key())).unwrap();
//! assert!(verify_attestation(
//!     &bound.key_material.public_key(),
//!     &bound.attestation,
//!     &root.public_key(),
//! ));
//! ```

use thiserror::Error;

use crate::chain::KeyInput;
use crate::config::{ATTEST_OVERHEAD, METADATA_PREFIX_LENGTH, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};
use crate::crypto::material::{KeyError, KeyMaterial, PublicKey};
use crate::crypto::{algebra, signing};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while building or decoding attestations.
///
/// Note that [`verify_attestation`] never raises: it is a predicate and
/// reports every failure, including malformed records, as `false`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AttestError {
    /// The root signature did not verify over the attestable payload. The
    /// caller's authorization is invalid; nothing was derived.
    #[error("root signature verification failed for attestable payload")]
    VerificationFailed,

    /// The record is shorter than its fixed fields.
    #[error("attestation record truncated: need at least {min} bytes, got {got}")]
    Truncated {
        /// Minimum length a record of this shape can have.
        min: usize,
        /// Length actually supplied.
        got: usize,
    },

    /// The metadata length prefix disagrees with the record length.
    #[error("metadata length prefix inconsistent with record size")]
    LengthMismatch,

    /// Metadata too large for the u32 length prefix.
    #[error("metadata length {got} exceeds the u32 length prefix range")]
    MetadataTooLarge {
        /// Length actually supplied.
        got: usize,
    },

    /// Key material supplied to an operation was malformed.
    #[error(transparent)]
    Key(#[from] KeyError),
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A decoded attest record: the base key, the attested metadata, and the
/// root's signature over the attestable payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attestation {
    /// The public key the metadata is bound to.
    pub base: PublicKey,
    /// The attested metadata, opaque to this crate.
    pub metadata: Vec<u8>,
    /// Detached signature over the attestable payload.
    pub signature: [u8; SIGNATURE_LENGTH],
}

impl Attestation {
    /// The attestable payload: what the root signs.
    pub fn attestable(&self) -> Vec<u8> {
        encode_attestable(&self.base, &self.metadata)
    }

    /// Canonical byte form of the full record.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = self.attestable();
        out.extend_from_slice(&self.signature);
        out
    }

    /// Decode a record, enforcing the canonical layout.
    ///
    /// Rejects truncation, and rejects records whose total length does not
    /// match the metadata length prefix (no trailing bytes).
    pub fn decode(bytes: &[u8]) -> Result<Self, AttestError> {
        if bytes.len() < ATTEST_OVERHEAD {
            return Err(AttestError::Truncated {
                min: ATTEST_OVERHEAD,
                got: bytes.len(),
            });
        }

        let mut base = [0u8; PUBLIC_KEY_LENGTH];
        base.copy_from_slice(&bytes[..PUBLIC_KEY_LENGTH]);

        let mut prefix = [0u8; METADATA_PREFIX_LENGTH];
        prefix.copy_from_slice(&bytes[PUBLIC_KEY_LENGTH..PUBLIC_KEY_LENGTH + METADATA_PREFIX_LENGTH]);
        let metadata_len = u32::from_le_bytes(prefix) as usize;

        if bytes.len() != ATTEST_OVERHEAD + metadata_len {
            return Err(AttestError::LengthMismatch);
        }

        let metadata_start = PUBLIC_KEY_LENGTH + METADATA_PREFIX_LENGTH;
        let metadata = bytes[metadata_start..metadata_start + metadata_len].to_vec();

        let mut signature = [0u8; SIGNATURE_LENGTH];
        signature.copy_from_slice(&bytes[metadata_start + metadata_len..]);

        Ok(Self {
            base: PublicKey::from_bytes(base),
            metadata,
            signature,
        })
    }
}

fn encode_attestable(base: &PublicKey, metadata: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(PUBLIC_KEY_LENGTH + METADATA_PREFIX_LENGTH + metadata.len());
    out.extend_from_slice(base.as_bytes());
    out.extend_from_slice(&(metadata.len() as u32).to_le_bytes());
    out.extend_from_slice(metadata);
    out
}

fn check_metadata_len(metadata: &[u8]) -> Result<(), AttestError> {
    if metadata.len() > u32::MAX as usize {
        return Err(AttestError::MetadataTooLarge {
            got: metadata.len(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// A successfully bound attestation: the derived key and the canonical
/// record bytes whose hash the derivation committed to.
#[derive(Clone, Debug)]
pub struct BoundAttestation {
    /// The derived key: base plus the tweak of the full attest record.
    /// Carries the secret side when the base did.
    pub key_material: KeyMaterial,
    /// The encoded attest record to persist or transmit alongside the key.
    pub attestation: Vec<u8>,
}

/// Canonical attestable payload for `(base, metadata)`.
///
/// This is what the root authority signs. `base` may be a chain (reduced to
/// its head public key), key material, or raw public key bytes.
pub fn get_attestable(
    base: impl Into<KeyInput>,
    metadata: &[u8],
) -> Result<Vec<u8>, AttestError> {
    check_metadata_len(metadata)?;
    let base = base.into().resolve()?;
    Ok(encode_attestable(&base.public_key(), metadata))
}

/// Bind a signed attestation into a key derivation.
///
/// Recomputes the attestable payload for `key` and `metadata`; when
/// `root_public_key` is supplied, the signature is verified over it first
/// and a bad signature aborts with [`AttestError::VerificationFailed`]
/// before anything is derived. The full attest record is then hashed into a
/// tweak and added onto `key`.
///
/// The derived key's path commits to the base key, the metadata, and the
/// root's authorization all at once: change any byte of the three and the
/// derived point moves.
pub fn bind_attestation(
    key: impl Into<KeyInput>,
    metadata: &[u8],
    signature: &[u8],
    root_public_key: Option<&PublicKey>,
) -> Result<BoundAttestation, AttestError> {
    check_metadata_len(metadata)?;
    let key = key.into().resolve()?;
    let signature: [u8; SIGNATURE_LENGTH] =
        signature
            .try_into()
            .map_err(|_| KeyError::InvalidSignatureLength {
                expected: SIGNATURE_LENGTH,
                got: signature.len(),
            })?;

    let record = Attestation {
        base: key.public_key(),
        metadata: metadata.to_vec(),
        signature,
    };

    if let Some(root) = root_public_key {
        if !signing::verify_detached(root, &record.attestable(), &record.signature) {
            return Err(AttestError::VerificationFailed);
        }
    }

    let attestation = record.encode();
    let tweak = algebra::tweak(&attestation);

    Ok(BoundAttestation {
        key_material: algebra::add(&key, &tweak),
        attestation,
    })
}

/// Check that `public_key` is the attestation-derived key for a record
/// authorized by `root_public_key`.
///
/// Fail closed: malformed records, bad signatures, non-point base bytes, and
/// derivation mismatches all report as `false`. This is a pure predicate and
/// never raises.
pub fn verify_attestation(
    public_key: &PublicKey,
    attestation: &[u8],
    root_public_key: &PublicKey,
) -> bool {
    let Ok(record) = Attestation::decode(attestation) else {
        return false;
    };

    if !signing::verify_detached(root_public_key, &record.attestable(), &record.signature) {
        return false;
    }

    let Ok(base) = KeyMaterial::from_public(record.base) else {
        return false;
    };
    let tweak = algebra::tweak(attestation);
    let check = algebra::add(&base, &tweak);

    check.public_key() == *public_key
}
