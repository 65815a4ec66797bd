// Copyright (c) 2026 Keyfold Contributors. MIT License.
// See LICENSE for details.

//! # Keyfold -- Tree-Structured Ed25519 Keys
//!
//! Keyfold derives whole families of Ed25519 signing keys from a single
//! root, deterministically, on both sides of the public/secret divide. A
//! secret holder and a party who knows only a public key walk the same
//! derivation tree and land on the same named sub-keys; only one of them
//! can sign. On top of the derivation algebra sits an attestation protocol
//! that lets a root authority bind metadata to a derived key so the binding
//! is checkable later from public data alone.
//!
//! ## Architecture
//!
//! - **crypto** -- The additive key algebra: reduced-scalar keypairs, scalar
//!   and point addition, deterministic tweaks, signing, verification, and
//!   key agreement.
//! - **chain** -- [`chain::Keychain`]: named derivation (`get`), path
//!   extension (`sub`), and re-rooting from a public key (`checkout`).
//! - **attest** -- Canonical attestation records plus the bind/verify
//!   operations that fold a root's authorization into a key derivation.
//! - **store** -- Filesystem seed bootstrap for roots that must survive a
//!   restart.
//! - **config** -- Lengths and derivation contexts. Consensus-critical.
//!
//! ## Design Rules
//!
//! 1. Deterministic derivations are pure functions of their inputs; the OS
//!    RNG is consulted only for fresh roots, and even that path takes the
//!    RNG as an injectable parameter.
//! 2. Values are immutable. Every derivation allocates, nothing aliases,
//!    and no operation blocks.
//! 3. Secret scalars stay out of `Debug`, logs, and serialized forms.
//!
//! ## Quick Start
//!
//! ```
//! use keyfold::chain::Keychain;
//!
//! // One seed, a whole tree of keys.
//! let root = Keychain::from_seed(&[0u8; 32]);
//! let feed = root.sub("app").sub("feed");
//! let signer = feed.get("announce");
//!
//! let sig = signer.sign(b"hello network").unwrap();
//!
//! // A remote peer reconstructs the same leaf from public data only.
//! let remote = Keychain::from_key(root.public_key()).unwrap();
//! let verifier = remote.sub("app").sub("feed").get("announce");
//! assert_eq!(verifier.public_key(), signer.public_key());
//! assert!(verifier.verify(b"hello network", &sig));
//! ```

pub mod attest;
pub mod chain;
pub mod config;
pub mod crypto;
pub mod store;
