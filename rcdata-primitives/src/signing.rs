//! Ed25519 signing and verification keyed by [`KeyRef`].

use std::collections::HashMap;

use ed25519_dalek::{
    Signature as DalekSignature, Signer as _, SigningKey as DalekSigningKey, Verifier as _,
    VerifyingKey as DalekVerifyingKey,
};
use rand::rngs::OsRng;
use rcdata_format::KeyRef;

use crate::error::{PrimitiveError, PrimitiveResult};
use crate::Signer;

/// Algorithm name recorded in the metadata for Ed25519.
pub const ED25519: &str = "ed25519";

/// Size of an Ed25519 signature in bytes.
pub const SIGNATURE_LEN: usize = 64;

/// Ed25519 signing key (secret).
pub struct SigningKey(DalekSigningKey);

/// Ed25519 verifying key (public).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct VerifyingKey(DalekVerifyingKey);

/// A keypair for signing and verification.
pub struct KeyPair {
    pub signing_key: SigningKey,
    pub verifying_key: VerifyingKey,
}

impl KeyPair {
    /// Generates a new random Ed25519 keypair.
    pub fn generate() -> Self {
        let signing = DalekSigningKey::generate(&mut OsRng);
        let verifying = signing.verifying_key();
        Self {
            signing_key: SigningKey(signing),
            verifying_key: VerifyingKey(verifying),
        }
    }

    /// Deterministic keypair from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing = SigningKey::from_bytes(seed);
        let verifying = signing.verifying_key();
        Self {
            signing_key: signing,
            verifying_key: verifying,
        }
    }
}

impl SigningKey {
    /// Creates a signing key from raw 32-byte secret.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self(DalekSigningKey::from_bytes(bytes))
    }

    /// Returns the raw 32-byte secret key.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// Returns the corresponding verifying key.
    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey(self.0.verifying_key())
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

impl VerifyingKey {
    /// Creates a verifying key from raw 32-byte public key.
    pub fn from_bytes(bytes: &[u8; 32]) -> PrimitiveResult<Self> {
        DalekVerifyingKey::from_bytes(bytes)
            .map(Self)
            .map_err(|_| PrimitiveError::InvalidPublicKey)
    }

    /// Parses a hex-encoded 32-byte public key.
    pub fn from_hex(encoded: &str) -> PrimitiveResult<Self> {
        let bytes = hex::decode(encoded.trim()).map_err(|_| PrimitiveError::InvalidPublicKey)?;
        let array: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| PrimitiveError::InvalidPublicKey)?;
        Self::from_bytes(&array)
    }

    /// Returns the raw 32-byte public key.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// Short hex identifier of the key, usable as a [`KeyRef`].
    pub fn fingerprint(&self) -> String {
        hex::encode(&self.to_bytes()[..8])
    }
}

impl std::fmt::Debug for VerifyingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VerifyingKey({})", hex::encode(self.to_bytes()))
    }
}

enum Entry {
    Signing(SigningKey),
    Verifying(VerifyingKey),
}

impl Entry {
    fn verifying_key(&self) -> VerifyingKey {
        match self {
            Self::Signing(k) => k.verifying_key(),
            Self::Verifying(k) => *k,
        }
    }
}

/// Ed25519 keys held by reference.
///
/// Writers register signing keys; readers may register only the public
/// half. The metadata carries the [`KeyRef`]; a file written without one is
/// checked against the default key.
#[derive(Default)]
pub struct Ed25519Keyring {
    keys: HashMap<KeyRef, Entry>,
    default_key: Option<KeyRef>,
}

impl Ed25519Keyring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a signing key. The first key registered becomes the default.
    pub fn with_signing_key(mut self, key_ref: KeyRef, key: SigningKey) -> Self {
        self.insert(key_ref, Entry::Signing(key));
        self
    }

    /// Registers a verify-only key. The first key registered becomes the default.
    pub fn with_verifying_key(mut self, key_ref: KeyRef, key: VerifyingKey) -> Self {
        self.insert(key_ref, Entry::Verifying(key));
        self
    }

    /// Overrides the key used when the metadata names none.
    pub fn with_default(mut self, key_ref: KeyRef) -> Self {
        self.default_key = Some(key_ref);
        self
    }

    pub fn contains(&self, key_ref: &KeyRef) -> bool {
        self.keys.contains_key(key_ref)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn insert(&mut self, key_ref: KeyRef, entry: Entry) {
        if self.default_key.is_none() {
            self.default_key = Some(key_ref.clone());
        }
        self.keys.insert(key_ref, entry);
    }

    fn entry(&self, key_ref: Option<&KeyRef>) -> PrimitiveResult<&Entry> {
        let key_ref = key_ref
            .or(self.default_key.as_ref())
            .ok_or(PrimitiveError::MissingKeyRef)?;
        self.keys
            .get(key_ref)
            .ok_or_else(|| PrimitiveError::UnknownKey(key_ref.to_string()))
    }
}

impl Signer for Ed25519Keyring {
    fn supports(&self, algorithm: &str) -> bool {
        algorithm == ED25519
    }

    fn sign(
        &self,
        data: &[u8],
        algorithm: &str,
        key_ref: Option<&KeyRef>,
    ) -> PrimitiveResult<Vec<u8>> {
        if !self.supports(algorithm) {
            return Err(PrimitiveError::unsupported("signing", algorithm));
        }
        match self.entry(key_ref)? {
            Entry::Signing(key) => Ok(key.0.sign(data).to_bytes().to_vec()),
            Entry::Verifying(_) => Err(PrimitiveError::VerifyOnly(
                key_ref.map_or_else(|| "default".to_string(), KeyRef::to_string),
            )),
        }
    }

    fn verify(
        &self,
        data: &[u8],
        signature: &[u8],
        algorithm: &str,
        key_ref: Option<&KeyRef>,
    ) -> PrimitiveResult<bool> {
        if !self.supports(algorithm) {
            return Err(PrimitiveError::unsupported("signing", algorithm));
        }
        let bytes: [u8; SIGNATURE_LEN] =
            signature
                .try_into()
                .map_err(|_| PrimitiveError::MalformedSignature {
                    expected: SIGNATURE_LEN,
                    actual: signature.len(),
                })?;
        let signature = DalekSignature::from_bytes(&bytes);
        let key = self.entry(key_ref)?.verifying_key();
        Ok(key.0.verify(data, &signature).is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyring(kp: KeyPair) -> Ed25519Keyring {
        Ed25519Keyring::new().with_signing_key(KeyRef::new("k1"), kp.signing_key)
    }

    #[test]
    fn sign_verify_roundtrip() {
        let ring = keyring(KeyPair::generate());
        let k1 = KeyRef::new("k1");
        let sig = ring.sign(b"hello world", ED25519, Some(&k1)).unwrap();
        assert_eq!(sig.len(), SIGNATURE_LEN);
        assert!(ring.verify(b"hello world", &sig, ED25519, Some(&k1)).unwrap());
    }

    #[test]
    fn wrong_message_fails() {
        let ring = keyring(KeyPair::generate());
        let sig = ring.sign(b"correct", ED25519, None).unwrap();
        assert!(!ring.verify(b"wrong", &sig, ED25519, None).unwrap());
    }

    #[test]
    fn wrong_key_fails() {
        let signer = keyring(KeyPair::generate());
        let reader = Ed25519Keyring::new()
            .with_verifying_key(KeyRef::new("k1"), KeyPair::generate().verifying_key);
        let sig = signer.sign(b"message", ED25519, None).unwrap();
        assert!(!reader.verify(b"message", &sig, ED25519, None).unwrap());
    }

    #[test]
    fn verify_only_key_cannot_sign() {
        let kp = KeyPair::generate();
        let ring = Ed25519Keyring::new().with_verifying_key(KeyRef::new("pub"), kp.verifying_key);
        assert!(matches!(
            ring.sign(b"x", ED25519, None),
            Err(PrimitiveError::VerifyOnly(_))
        ));
    }

    #[test]
    fn unknown_key_ref() {
        let ring = keyring(KeyPair::generate());
        let other = KeyRef::new("other");
        assert!(matches!(
            ring.sign(b"x", ED25519, Some(&other)),
            Err(PrimitiveError::UnknownKey(_))
        ));
    }

    #[test]
    fn empty_keyring_needs_key_ref() {
        let ring = Ed25519Keyring::new();
        assert!(matches!(
            ring.sign(b"x", ED25519, None),
            Err(PrimitiveError::MissingKeyRef)
        ));
    }

    #[test]
    fn unsupported_algorithm() {
        let ring = keyring(KeyPair::generate());
        assert!(matches!(
            ring.sign(b"x", "rsa-2048", None),
            Err(PrimitiveError::UnsupportedAlgorithm { .. })
        ));
    }

    #[test]
    fn short_signature_is_malformed() {
        let ring = keyring(KeyPair::generate());
        assert!(matches!(
            ring.verify(b"x", &[0u8; 10], ED25519, None),
            Err(PrimitiveError::MalformedSignature { actual: 10, .. })
        ));
    }

    #[test]
    fn seeded_keypair_is_deterministic() {
        let a = KeyPair::from_seed(&[7u8; 32]);
        let b = KeyPair::from_seed(&[7u8; 32]);
        assert_eq!(a.verifying_key, b.verifying_key);
        assert_eq!(a.signing_key.to_bytes(), b.signing_key.to_bytes());
    }

    #[test]
    fn verifying_key_hex_roundtrip() {
        let kp = KeyPair::generate();
        let parsed = VerifyingKey::from_hex(&hex::encode(kp.verifying_key.to_bytes())).unwrap();
        assert_eq!(parsed, kp.verifying_key);
        assert_eq!(kp.verifying_key.fingerprint().len(), 16);
    }
}
