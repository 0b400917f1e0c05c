//! Codec error types.

use thiserror::Error;

/// Errors raised while decoding an embedded payload.
///
/// All of these are fatal for the block being decoded: the drain loop stops
/// and later blocks never execute. Note that a wrong cipher key is *not*
/// represented here — the cipher has no integrity check, so a bad key
/// surfaces later as `Inflate` (or as a syntax error in the browser).
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unrecognised transcoding character {0:?} at position {1}")]
    UnknownChar(char, usize),

    #[error("secondary character before end of input at position {0}")]
    EarlySecondary(usize),

    #[error("padding mismatch in final transcoding group")]
    PaddingMismatch,

    #[error("cipher payload length out of range")]
    CipherLength,

    #[error("decompression failed")]
    Inflate(#[source] std::io::Error),

    #[error("decoded chunk is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("unknown payload type `{0}`")]
    UnknownPayloadType(String),
}
