//! zstd compaction.

use crate::error::{PrimitiveError, PrimitiveResult};
use crate::Compactor;

/// Algorithm name recorded in the metadata for zstd.
pub const ZSTD: &str = "zstd";

/// Compactor backed by the `zstd` crate.
#[derive(Debug, Clone, Copy)]
pub struct ZstdCompactor {
    level: i32,
}

impl ZstdCompactor {
    pub fn new(level: i32) -> Self {
        Self { level }
    }

    pub fn level(&self) -> i32 {
        self.level
    }
}

impl Default for ZstdCompactor {
    fn default() -> Self {
        Self::new(zstd::DEFAULT_COMPRESSION_LEVEL)
    }
}

impl Compactor for ZstdCompactor {
    fn supports(&self, algorithm: &str) -> bool {
        algorithm == ZSTD
    }

    fn compress(&self, data: &[u8], algorithm: &str) -> PrimitiveResult<Vec<u8>> {
        if !self.supports(algorithm) {
            return Err(PrimitiveError::unsupported("compaction", algorithm));
        }
        zstd::encode_all(data, self.level).map_err(|e| PrimitiveError::Compression(e.to_string()))
    }

    fn decompress(&self, data: &[u8], algorithm: &str) -> PrimitiveResult<Vec<u8>> {
        if !self.supports(algorithm) {
            return Err(PrimitiveError::unsupported("compaction", algorithm));
        }
        zstd::decode_all(data).map_err(|e| PrimitiveError::Decompression(e.to_string()))
    }
}
