//! Binary-to-text encoding of artifacts for the JSON response envelope.

use crate::errors::Result;
use crate::job::Artifact;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Encoding chunk size. Must stay a multiple of 3: base64 pads at any
/// non-multiple-of-3 boundary, so only 3-aligned chunks concatenate into
/// the same string a whole-buffer encode would produce.
const CHUNK_SIZE: usize = 8190;

/// Base64-encode `bytes` in fixed-size chunks.
///
/// Chunking bounds intermediate growth on multi-megabyte documents; the
/// output is byte-identical to encoding the whole buffer at once.
pub fn encode(bytes: &[u8]) -> String {
    let mut encoded = String::with_capacity(bytes.len().div_ceil(3) * 4);

    for chunk in bytes.chunks(CHUNK_SIZE) {
        STANDARD.encode_string(chunk, &mut encoded);
    }

    encoded
}

pub fn encode_artifact(artifact: &Artifact) -> String {
    encode(&artifact.content)
}

/// Consumer-side contract: a standard base64 decode of the concatenated
/// string recovers the original bytes.
pub fn decode(encoded: &str) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(encoded)?)
}
