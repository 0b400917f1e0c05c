//! Compression stage: raw deflate over the whole buffer.
//!
//! Chosen for compactness over speed — the encode cost is paid once per
//! build, the decode cost once per page load. A corrupt stream is a hard
//! error, never recoverable.

use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use std::io::{Read, Write};

use super::CodecError;

/// Default compression level (favor size; build-time cost is amortized).
pub const DEFAULT_LEVEL: u32 = 9;

/// Compress a buffer with raw deflate.
pub fn deflate(data: &[u8], level: u32) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(level.min(9)));
    // Writing to a Vec cannot fail
    encoder.write_all(data).expect("write to Vec");
    encoder.finish().expect("finish to Vec")
}

/// Decompress a raw deflate stream.
///
/// A truncated or corrupt stream (including the aftermath of a wrong
/// cipher key) fails here.
pub fn inflate(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut decoder = DeflateDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).map_err(CodecError::Inflate)?;
    Ok(out)
}
