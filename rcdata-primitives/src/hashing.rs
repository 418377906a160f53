//! SHA-2 digests.

use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::error::{PrimitiveError, PrimitiveResult};
use crate::Hasher;

pub const SHA256: &str = "sha256";
pub const SHA384: &str = "sha384";
pub const SHA512: &str = "sha512";

/// Hasher for the SHA-2 family.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha2Hasher;

impl Hasher for Sha2Hasher {
    fn supports(&self, algorithm: &str) -> bool {
        matches!(algorithm, SHA256 | SHA384 | SHA512)
    }

    fn hash(&self, data: &[u8], algorithm: &str) -> PrimitiveResult<Vec<u8>> {
        match algorithm {
            SHA256 => Ok(Sha256::digest(data).to_vec()),
            SHA384 => Ok(Sha384::digest(data).to_vec()),
            SHA512 => Ok(Sha512::digest(data).to_vec()),
            other => Err(PrimitiveError::unsupported("hash", other)),
        }
    }
}

/// Hex-encoded SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
