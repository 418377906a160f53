//! MicroCode header and pipeline metadata for rcdata files.
//!
//! Every rcdata file starts with a self-describing preamble:
//!
//! ```text
//! [MicroCodeHeader: 2 bytes][expansion record: expand_len bytes][payload]
//! ```
//!
//! The header bits say which pipeline stages ran (compaction, encryption or
//! signing, hashing) and the expansion record names their algorithms, so a
//! reader needs no out-of-band knowledge of how the file was written.
//!
//! This crate is a pure codec: no I/O and no pipeline primitives.

mod content;
mod error;
mod header;
mod metadata;

pub use content::ContentType;
pub use error::{FormatError, FormatResult};
pub use header::{EXPAND_LEN_BITS, HEADER_LEN, MAX_EXPAND_LEN, MAX_PRIME, MicroCodeHeader};
pub use metadata::{EncryptStage, FORMAT_VERSION, KeyRef, PipelineConfig, PipelineMetadata};

/// Encodes the full preamble (header bits followed by the expansion record).
pub fn encode_preamble(metadata: &PipelineMetadata) -> Vec<u8> {
    let (header, record) = metadata.to_header_fields();
    let mut out = Vec::with_capacity(HEADER_LEN + record.len());
    out.extend_from_slice(&header.encode());
    out.extend_from_slice(&record);
    out
}

/// Decodes the preamble at the start of `buf`, returning the metadata and
/// the payload that follows it.
pub fn decode_preamble(buf: &[u8]) -> FormatResult<(PipelineMetadata, &[u8])> {
    let (header, expansion, payload) = MicroCodeHeader::split(buf)?;
    let metadata = PipelineMetadata::from_header_and_trailer(&header, expansion)?;
    Ok((metadata, payload))
}
