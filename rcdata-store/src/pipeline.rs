//! Stage framing for the persisted body.
//!
//! ```text
//! body = [digest_len:u8][digest]        (hash stage)
//!        [sig_len:u16 LE][signature]    (signing stage)
//!        payload                        (compacted when the compact stage ran)
//! ```
//!
//! Each frame covers everything after it.

use rcdata_format::PipelineMetadata;
use rcdata_primitives::{PrimitiveError, Primitives};
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Runs compact, sign, and hash over `payload` as `metadata` prescribes.
pub(crate) fn seal(
    payload: Vec<u8>,
    metadata: &PipelineMetadata,
    primitives: &Primitives,
) -> StoreResult<Vec<u8>> {
    let mut body = payload;

    if let Some(algorithm) = metadata.compact_algorithm() {
        let before = body.len();
        body = primitives.compactor.compress(&body, algorithm)?;
        debug!(algorithm, before, after = body.len(), "Compacted payload");
    }

    if let Some(stage) = metadata.encrypt() {
        let signature = primitives
            .signer
            .sign(&body, &stage.algorithm, stage.key_ref.as_ref())?;
        let len = u16::try_from(signature.len()).map_err(|_| {
            StoreError::Config(format!(
                "{} signature too long: {}",
                stage.algorithm,
                signature.len()
            ))
        })?;
        body = frame(&len.to_le_bytes(), &signature, body);
    }

    if let Some(algorithm) = metadata.hash_algorithm() {
        let digest = primitives.hasher.hash(&body, algorithm)?;
        let len = u8::try_from(digest.len()).map_err(|_| {
            StoreError::Config(format!("{algorithm} digest too long: {}", digest.len()))
        })?;
        body = frame(&[len], &digest, body);
    }

    Ok(body)
}

/// Reverses [`seal`]: verifies the hash, then the signature, then
/// decompresses.
pub(crate) fn unseal(
    body: &[u8],
    metadata: &PipelineMetadata,
    primitives: &Primitives,
) -> StoreResult<Vec<u8>> {
    let mut rest = body;

    if let Some(algorithm) = metadata.hash_algorithm() {
        let (len, after) = take(rest, 1, "digest length")?;
        let (stored, after) = take(after, usize::from(len[0]), "digest")?;
        let computed = primitives.hasher.hash(after, algorithm)?;
        if computed != stored {
            return Err(StoreError::Integrity {
                algorithm: algorithm.to_string(),
                expected: hex::encode(stored),
                actual: hex::encode(&computed),
            });
        }
        rest = after;
    }

    if let Some(stage) = metadata.encrypt() {
        let (len, after) = take(rest, 2, "signature length")?;
        let len = u16::from_le_bytes([len[0], len[1]]);
        let (signature, after) = take(after, usize::from(len), "signature")?;
        let valid = primitives
            .signer
            .verify(after, signature, &stage.algorithm, stage.key_ref.as_ref())
            .map_err(verification_error)?;
        if !valid {
            return Err(StoreError::Security(format!(
                "{} signature does not match the content",
                stage.algorithm
            )));
        }
        rest = after;
    }

    match metadata.compact_algorithm() {
        Some(algorithm) => Ok(primitives.compactor.decompress(rest, algorithm)?),
        None => Ok(rest.to_vec()),
    }
}

fn frame(len: &[u8], value: &[u8], body: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(len.len() + value.len() + body.len());
    out.extend_from_slice(len);
    out.extend_from_slice(value);
    out.extend_from_slice(&body);
    out
}

fn take<'a>(buf: &'a [u8], n: usize, what: &str) -> StoreResult<(&'a [u8], &'a [u8])> {
    if buf.len() < n {
        return Err(StoreError::Format(format!(
            "truncated {what}: need {n} bytes, have {}",
            buf.len()
        )));
    }
    Ok(buf.split_at(n))
}

// A reader that cannot check a signature must not accept the content.
fn verification_error(err: PrimitiveError) -> StoreError {
    match err {
        PrimitiveError::UnsupportedAlgorithm { stage, name } => {
            StoreError::UnsupportedAlgorithm { stage, name }
        }
        other => StoreError::Security(other.to_string()),
    }
}
