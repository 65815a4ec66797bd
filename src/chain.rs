//! # Key Chains
//!
//! A [`Keychain`] is an immutable node in a derivation tree. It pairs the
//! root it grew from with an accumulated tweak, and its effective identity
//! is the *head*: base key plus accumulated tweak.
//!
//! Three operations move through the tree:
//!
//! - [`Keychain::get`] derives a one-off named leaf signer under the current
//!   head. The leaf tweak is not folded back into the chain.
//! - [`Keychain::sub`] extends the path: the step tweak is folded into the
//!   accumulated tweak, producing a new node with a new head.
//! - [`Keychain::checkout`] re-roots at an already-derived key, clearing the
//!   tweak. A party holding only a derived *public* key can check it out and
//!   then reproduce, name for name, the same sub-keys the secret holder
//!   derives. That is the property that makes public verification trees work.
//!
//! Each derivation step hashes the name together with the *running* head
//! public key, so `sub("a").sub("b")` and `sub("b").sub("a")` land on
//! different heads. Path order is meaningful on purpose.
//!
//! ## Example
//!
//! ```
//! use keyfold::chain::Keychain;
//!
//! let root = Keychain::from_seed(&[1u8; 32]);
//! let device = root.sub("devices").sub("laptop");
//!
//! // A verifier holding only the derived public key reproduces the same
//! // leaf public keys, but cannot sign.
//! let verifier = root.checkout(device.public_key()).unwrap();
//! assert_eq!(
//!     verifier.get("session").public_key(),
//!     device.get("session").public_key(),
//! );
//! assert!(!verifier.get("session").has_secret());
//! ```

use std::fmt;

use ed25519_dalek::SigningKey;
use rand_core::CryptoRngCore;

use crate::config::SEED_LENGTH;
use crate::crypto::algebra;
use crate::crypto::material::{KeyError, KeyMaterial, PublicKey, Signer};

// ---------------------------------------------------------------------------
// Input unions
// ---------------------------------------------------------------------------

/// Anything accepted where a key is expected.
///
/// Raw bytes are validated (length and curve membership) exactly once, when
/// [`KeyInput::resolve`] runs at the API boundary. Everything downstream
/// works with already-admitted [`KeyMaterial`].
#[derive(Clone, Debug)]
pub enum KeyInput {
    /// An unvalidated 32-byte compressed public key.
    Raw([u8; 32]),
    /// Already-validated key material, public-only or full.
    Material(KeyMaterial),
}

impl KeyInput {
    /// Resolve to validated key material.
    pub fn resolve(self) -> Result<KeyMaterial, KeyError> {
        match self {
            KeyInput::Raw(bytes) => KeyMaterial::try_from_slice(&bytes),
            KeyInput::Material(material) => Ok(material),
        }
    }
}

impl From<[u8; 32]> for KeyInput {
    fn from(bytes: [u8; 32]) -> Self {
        KeyInput::Raw(bytes)
    }
}

impl From<PublicKey> for KeyInput {
    fn from(public: PublicKey) -> Self {
        KeyInput::Raw(public.to_bytes())
    }
}

impl From<KeyMaterial> for KeyInput {
    fn from(material: KeyMaterial) -> Self {
        KeyInput::Material(material)
    }
}

impl From<&KeyMaterial> for KeyInput {
    fn from(material: &KeyMaterial) -> Self {
        KeyInput::Material(material.clone())
    }
}

impl From<&Signer> for KeyInput {
    fn from(signer: &Signer) -> Self {
        KeyInput::Material(signer.key_material().clone())
    }
}

impl From<&Keychain> for KeyInput {
    fn from(chain: &Keychain) -> Self {
        KeyInput::Material(chain.head().clone())
    }
}

impl From<&SigningKey> for KeyInput {
    fn from(key: &SigningKey) -> Self {
        KeyInput::Material(KeyMaterial::from_signing_key(key))
    }
}

/// Anything accepted as a derivation step by [`Keychain::get`] and
/// [`Keychain::sub`].
#[derive(Clone, Debug)]
pub enum Derivation {
    /// A name. Hashed together with the running head public key to produce
    /// the step tweak. Empty means "the head itself" for `get`.
    Name(Vec<u8>),
    /// A pre-built tweak keypair, used directly without hashing. This is how
    /// an accumulated tweak lifted out of one chain replays onto another.
    Key(KeyMaterial),
}

impl From<&str> for Derivation {
    fn from(name: &str) -> Self {
        Derivation::Name(name.as_bytes().to_vec())
    }
}

impl From<String> for Derivation {
    fn from(name: String) -> Self {
        Derivation::Name(name.into_bytes())
    }
}

impl From<&[u8]> for Derivation {
    fn from(name: &[u8]) -> Self {
        Derivation::Name(name.to_vec())
    }
}

impl From<Vec<u8>> for Derivation {
    fn from(name: Vec<u8>) -> Self {
        Derivation::Name(name)
    }
}

impl From<KeyMaterial> for Derivation {
    fn from(material: KeyMaterial) -> Self {
        Derivation::Key(material)
    }
}

impl From<&KeyMaterial> for Derivation {
    fn from(material: &KeyMaterial) -> Self {
        Derivation::Key(material.clone())
    }
}

// ---------------------------------------------------------------------------
// Keychain
// ---------------------------------------------------------------------------

/// An immutable node in a key derivation tree.
///
/// Fields: `home` (the root this tree grew from), `base` (where this node's
/// chain is rooted, defaults to home), `tweak` (the accumulated tweak, if
/// any), and `head = base + tweak`, the node's effective key.
///
/// Derivations return new nodes; nothing is ever mutated, so chains can be
/// shared freely across threads.
#[derive(Clone)]
pub struct Keychain {
    home: KeyMaterial,
    base: KeyMaterial,
    tweak: Option<KeyMaterial>,
    head: KeyMaterial,
}

impl Keychain {
    fn assemble(home: KeyMaterial, base: KeyMaterial, tweak: Option<KeyMaterial>) -> Self {
        let head = match &tweak {
            Some(t) => algebra::add(&base, t),
            None => base.clone(),
        };
        Self {
            home,
            base,
            tweak,
            head,
        }
    }

    /// A fresh root chain with a random signing key from the OS RNG.
    pub fn new() -> Self {
        Self::from_key_material(algebra::random_keypair())
    }

    /// A fresh root chain seeded from a caller-supplied RNG.
    pub fn with_rng<R: CryptoRngCore>(rng: &mut R) -> Self {
        Self::from_key_material(algebra::random_keypair_with(rng))
    }

    /// A deterministic root chain from a 32-byte seed.
    ///
    /// The same seed always reconstructs the same tree, which is the whole
    /// point: persist one seed, regenerate every key.
    pub fn from_seed(seed: &[u8; SEED_LENGTH]) -> Self {
        Self::from_key_material(algebra::generate_keypair(seed))
    }

    /// Root a chain at an existing key: raw public bytes, a [`PublicKey`],
    /// key material, or a standard signing key.
    ///
    /// With secret material the chain signs; with a public key it derives
    /// the identical tree of public keys and signs nothing.
    pub fn from_key(key: impl Into<KeyInput>) -> Result<Self, KeyError> {
        Ok(Self::from_key_material(key.into().resolve()?))
    }

    /// Root a chain at already-validated key material.
    pub fn from_key_material(key: KeyMaterial) -> Self {
        Self::assemble(key.clone(), key, None)
    }

    /// The head public key: this node's effective identity.
    pub fn public_key(&self) -> PublicKey {
        self.head.public_key()
    }

    /// The head key material (base plus accumulated tweak).
    pub fn head(&self) -> &KeyMaterial {
        &self.head
    }

    /// The root this chain grew from.
    pub fn home(&self) -> &KeyMaterial {
        &self.home
    }

    /// The key this node's chain is rooted at.
    pub fn base(&self) -> &KeyMaterial {
        &self.base
    }

    /// The accumulated tweak, if any derivation steps have been taken.
    ///
    /// Feeding this into [`Keychain::sub`] on a chain rooted at the same
    /// base replays the whole path in one step.
    pub fn tweak(&self) -> Option<&KeyMaterial> {
        self.tweak.as_ref()
    }

    /// Whether this chain can produce signing leaves.
    pub fn has_secret(&self) -> bool {
        self.head.has_secret()
    }

    /// A signer bound to the head itself. Equivalent to `get` with an empty
    /// name.
    pub fn signer(&self) -> Signer {
        self.head.signer()
    }

    /// Derive a one-off named signer under the current head.
    ///
    /// The leaf tweak is `tweak(name || head_public)`; it is *not* folded
    /// into the chain, so the leaf has no further children. An empty name
    /// returns the head signer. A [`Derivation::Key`] input is used as the
    /// tweak keypair directly.
    pub fn get(&self, name: impl Into<Derivation>) -> Signer {
        match name.into() {
            Derivation::Name(name) if name.is_empty() => self.head.signer(),
            Derivation::Name(name) => {
                let head_public = self.head.public_key();
                let leaf = algebra::tweak_parts(&[&name, head_public.as_bytes()]);
                algebra::add(&self.head, &leaf).signer()
            }
            Derivation::Key(tweak) => algebra::add(&self.head, &tweak).signer(),
        }
    }

    /// Extend the chain by one named step.
    ///
    /// The step tweak is `tweak(name || head_public)`, folded into the
    /// accumulated tweak. The returned node keeps this chain's home and base
    /// but has a new head; the original node is untouched.
    pub fn sub(&self, name: impl Into<Derivation>) -> Keychain {
        let step = match name.into() {
            Derivation::Name(name) => {
                let head_public = self.head.public_key();
                algebra::tweak_parts(&[&name, head_public.as_bytes()])
            }
            Derivation::Key(tweak) => tweak,
        };
        let accumulated = match &self.tweak {
            Some(previous) => algebra::add(&step, previous),
            None => step,
        };
        Self::assemble(self.home.clone(), self.base.clone(), Some(accumulated))
    }

    /// Re-root the chain at an already-derived key.
    ///
    /// The supplied key becomes the new base, the accumulated tweak is
    /// cleared, and home is retained. Checking out a chain's own derived
    /// public key yields a node whose `get`/`sub` reproduce that subtree's
    /// public keys exactly, with or without the secret side.
    pub fn checkout(&self, key: impl Into<KeyInput>) -> Result<Keychain, KeyError> {
        let base = key.into().resolve()?;
        Ok(Self::assemble(self.home.clone(), base, None))
    }
}

impl Default for Keychain {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Keychain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Keychain(head={}, tweaked={}, secret={})",
            &self.public_key().to_hex()[..16],
            self.tweak.is_some(),
            if self.has_secret() { "yes" } else { "no" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_signer_signs() {
        let keys = Keychain::new();
        let signer = keys.get("");
        assert!(signer.has_secret());
        let sig = signer.sign(b"root message").unwrap();
        assert!(signer.verify(b"root message", &sig));
    }

    #[test]
    fn deterministic_root() {
        let a = Keychain::from_seed(&[0u8; 32]);
        let b = Keychain::from_seed(&[0u8; 32]);
        assert_eq!(a.public_key(), b.public_key());

        // Stable, non-trivial public key for the all-zero seed.
        assert_ne!(a.public_key().to_bytes(), [0u8; 32]);
    }

    #[test]
    fn public_root_mirrors_secret_root() {
        let keys = Keychain::from_seed(&[0u8; 32]);
        let signer = keys.signer();

        let public_keys = Keychain::from_key(keys.public_key()).unwrap();
        let verifier = public_keys.signer();

        assert_eq!(verifier.public_key(), signer.public_key());
        assert!(!verifier.has_secret());
        assert!(signer.has_secret());
    }

    #[test]
    fn named_leaves_mirror_across_public_checkout() {
        let keys = Keychain::from_seed(&[0u8; 32]);
        let signer = keys.get("test");

        let public_keys = Keychain::from_key(keys.public_key()).unwrap();
        let verifier = public_keys.get("test");

        assert_eq!(verifier.public_key(), signer.public_key());
        assert!(!verifier.has_secret());

        // Extending then taking the head signer lands on the same key.
        let main = public_keys.sub("test").get("");
        assert_eq!(main.public_key(), signer.public_key());
    }

    #[test]
    fn named_leaf_differs_from_head() {
        let keys = Keychain::from_seed(&[0u8; 32]);
        assert_ne!(keys.get("test").public_key(), keys.get("").public_key());

        // And is reproducible from the same seed.
        let again = Keychain::from_seed(&[0u8; 32]);
        assert_eq!(keys.get("test").public_key(), again.get("test").public_key());
    }

    #[test]
    fn get_does_not_advance_the_chain() {
        let keys = Keychain::from_seed(&[1u8; 32]);
        let before = keys.public_key();
        let _ = keys.get("leaf");
        assert_eq!(keys.public_key(), before);
        assert!(keys.tweak().is_none());
    }

    #[test]
    fn sub_path_order_is_significant() {
        let keys = Keychain::from_seed(&[1u8; 32]);
        let ab = keys.sub("a").sub("b");
        let ba = keys.sub("b").sub("a");
        assert_ne!(ab.public_key(), ba.public_key());
    }

    #[test]
    fn get_and_sub_leaf_agree() {
        // get(name) under a node and sub(name).signer() both land on
        // head + tweak(name || head_public).
        let keys = Keychain::from_seed(&[2u8; 32]);
        assert_eq!(
            keys.get("x").public_key(),
            keys.sub("x").signer().public_key()
        );
    }

    #[test]
    fn sub_accepts_accumulated_tweak() {
        let keys = Keychain::from_seed(&[3u8; 32]);
        let walked = keys.sub("foo").sub("bar");
        let replayed = keys.sub(walked.tweak().unwrap());
        assert_eq!(walked.public_key(), replayed.public_key());
    }

    #[test]
    fn checkout_reproduces_subtree() {
        let keys = Keychain::from_seed(&[4u8; 32]);
        let sub = keys.sub("n");

        let checked_out = keys.checkout(sub.public_key()).unwrap();
        assert_eq!(
            checked_out.get("").public_key(),
            sub.get("").public_key()
        );
        assert_eq!(
            checked_out.get("leaf").public_key(),
            sub.get("leaf").public_key()
        );
        assert_eq!(
            checked_out.sub("deeper").public_key(),
            sub.sub("deeper").public_key()
        );
    }

    #[test]
    fn checkout_with_full_material_keeps_signing() {
        let keys = Keychain::from_seed(&[5u8; 32]);
        let sub = keys.sub("signer-subtree");

        let checked_out = keys.checkout(sub.head()).unwrap();
        assert!(checked_out.has_secret());
        let sig = checked_out.get("leaf").sign(b"payload").unwrap();
        assert!(sub.get("leaf").verify(b"payload", &sig));
    }

    #[test]
    fn checkout_rejects_invalid_bytes() {
        let keys = Keychain::from_seed(&[6u8; 32]);

        // Find bytes that fail decompression and make sure checkout refuses.
        let bad = (0u8..64).find_map(|y| {
            let mut bytes = [0u8; 32];
            bytes[0] = y;
            keys.checkout(bytes).err()
        });
        assert_eq!(bad, Some(KeyError::InvalidPublicKey));
    }

    #[test]
    fn derivation_tree_scalar_consistency() {
        use curve25519_dalek::edwards::EdwardsPoint;
        use curve25519_dalek::scalar::Scalar;

        let keys = Keychain::from_seed(&[7u8; 32]);
        for material in [
            keys.head().clone(),
            keys.sub("a").head().clone(),
            keys.sub("a").sub("b").head().clone(),
            keys.get("leaf").key_material().clone(),
        ] {
            let scalar = Scalar::from_bytes_mod_order(material.scalar_bytes().unwrap());
            assert_eq!(
                material.public_key().as_bytes(),
                &EdwardsPoint::mul_base(&scalar).compress().to_bytes()
            );
        }
    }

    #[test]
    fn from_signing_key_roots_a_signing_chain() {
        let sk = ed25519_dalek::SigningKey::from_bytes(&[8u8; 32]);
        let keys = Keychain::from_key(&sk).unwrap();
        assert_eq!(keys.public_key().as_bytes(), &sk.verifying_key().to_bytes());

        let sig = keys.get("leaf").sign(b"msg").unwrap();
        assert!(keys.get("leaf").verify(b"msg", &sig));
    }
}
