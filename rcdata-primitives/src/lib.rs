//! Pipeline primitives for rcdata.
//!
//! The persistence pipeline only decides *whether* a stage runs and *which*
//! named algorithm it uses. The actual work is delegated to three narrow
//! traits, injected into the store at construction:
//! - [`Compactor`]: compress / decompress by algorithm name
//! - [`Signer`]: detached signatures over the payload, keys held by reference
//! - [`Hasher`]: digests by algorithm name
//!
//! Shipped adapters: [`ZstdCompactor`] (`zstd`), [`Ed25519Keyring`]
//! (`ed25519`), and [`Sha2Hasher`] (`sha256`, `sha384`, `sha512`).

mod compaction;
mod error;
mod hashing;
mod signing;

use std::sync::Arc;

use rcdata_format::KeyRef;

pub use compaction::{ZSTD, ZstdCompactor};
pub use error::{PrimitiveError, PrimitiveResult};
pub use hashing::{SHA256, SHA384, SHA512, Sha2Hasher, sha256_hex};
pub use signing::{ED25519, Ed25519Keyring, KeyPair, SIGNATURE_LEN, SigningKey, VerifyingKey};

/// Compression by algorithm name.
pub trait Compactor: Send + Sync {
    fn supports(&self, algorithm: &str) -> bool;

    fn compress(&self, data: &[u8], algorithm: &str) -> PrimitiveResult<Vec<u8>>;

    fn decompress(&self, data: &[u8], algorithm: &str) -> PrimitiveResult<Vec<u8>>;
}

/// Detached signatures. Key material stays inside the implementation and
/// is selected by [`KeyRef`]; `None` means the implementation's default key.
pub trait Signer: Send + Sync {
    fn supports(&self, algorithm: &str) -> bool;

    fn sign(
        &self,
        data: &[u8],
        algorithm: &str,
        key_ref: Option<&KeyRef>,
    ) -> PrimitiveResult<Vec<u8>>;

    /// Returns `Ok(false)` for a well-formed signature that does not match.
    fn verify(
        &self,
        data: &[u8],
        signature: &[u8],
        algorithm: &str,
        key_ref: Option<&KeyRef>,
    ) -> PrimitiveResult<bool>;
}

/// Digests by algorithm name.
pub trait Hasher: Send + Sync {
    fn supports(&self, algorithm: &str) -> bool;

    fn hash(&self, data: &[u8], algorithm: &str) -> PrimitiveResult<Vec<u8>>;
}

/// The set of primitives a store runs its pipeline with.
#[derive(Clone)]
pub struct Primitives {
    pub compactor: Arc<dyn Compactor>,
    pub signer: Arc<dyn Signer>,
    pub hasher: Arc<dyn Hasher>,
}

impl Primitives {
    pub fn new(
        compactor: Arc<dyn Compactor>,
        signer: Arc<dyn Signer>,
        hasher: Arc<dyn Hasher>,
    ) -> Self {
        Self {
            compactor,
            signer,
            hasher,
        }
    }

    /// zstd, SHA-2, and an empty Ed25519 keyring.
    pub fn standard() -> Self {
        Self::with_keyring(Ed25519Keyring::new())
    }

    /// zstd and SHA-2 with the given Ed25519 keys.
    pub fn with_keyring(keyring: Ed25519Keyring) -> Self {
        Self::new(
            Arc::new(ZstdCompactor::default()),
            Arc::new(keyring),
            Arc::new(Sha2Hasher),
        )
    }
}

impl Default for Primitives {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for Primitives {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Primitives").finish_non_exhaustive()
    }
}
