//! Payload codec: the reversible pipeline that makes arbitrary bytes
//! embeddable as inert text inside an HTML document.
//!
//! `encode` applies compress -> cipher -> text-safe transcode; `decode`
//! applies the exact inverse chain. The law `decode(encode(x)) == x` holds
//! for every input and every key, and both sides must agree on the
//! [`Strategy`] — the assembler records it in the payload element type so a
//! decoder can never silently mix stage choices.
//!
//! Strategies:
//! - [`Strategy::BitPack`] (default): deflate + XXTEA + 15-bit repertoire
//!   packing. Densest output.
//! - [`Strategy::Wide`]: a single fixed-width UTF-16-safe packing stage;
//!   the compression and cipher stages are no-ops in this configuration.

mod cipher;
mod compress;
mod error;
mod transcode;

pub use compress::DEFAULT_LEVEL;
pub use error::CodecError;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Key shipped when the config does not override it. Obfuscation only:
/// it travels in the same artifact as the ciphertext.
pub const DEFAULT_KEY: &str = "your-key";

/// Prefix of the payload element `type` attribute; the strategy name is
/// appended after a `+`.
pub const PAYLOAD_TYPE_PREFIX: &str = "application/onepack";

// ============================================================================
// Strategy
// ============================================================================

/// Which sub-stages of the codec are active. Selected at build time;
/// encode and decode must use the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// deflate + XXTEA + two-repertoire 15-bit packing.
    #[default]
    BitPack,
    /// Fixed-width UTF-16-safe packing only (cipher and compression off).
    Wide,
}

impl Strategy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BitPack => "bitpack",
            Self::Wide => "wide",
        }
    }

    /// The `type` attribute value payload elements carry for this strategy.
    pub fn payload_type(self) -> String {
        format!("{}+{}", PAYLOAD_TYPE_PREFIX, self.as_str())
    }

    /// Recover the strategy from a payload element `type` attribute.
    pub fn from_payload_type(value: &str) -> Result<Self, CodecError> {
        match value.strip_prefix(PAYLOAD_TYPE_PREFIX).and_then(|rest| {
            rest.strip_prefix('+')
        }) {
            Some("bitpack") => Ok(Self::BitPack),
            Some("wide") => Ok(Self::Wide),
            _ => Err(CodecError::UnknownPayloadType(value.to_string())),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bitpack" => Ok(Self::BitPack),
            "wide" => Ok(Self::Wide),
            other => Err(format!("unknown strategy {other:?} (expected bitpack or wide)")),
        }
    }
}

// ============================================================================
// Codec
// ============================================================================

/// A configured encode/decode pipeline. Pure and stateless: the same value
/// is shared by the assembler (encode) and the runtime loader (decode).
#[derive(Debug, Clone)]
pub struct Codec {
    strategy: Strategy,
    key: [u8; 16],
    level: u32,
}

impl Codec {
    /// Build a codec. The key is normalized to exactly 16 bytes
    /// (zero-padded or truncated), identically at encode and decode time.
    pub fn new(strategy: Strategy, key: &str, level: u32) -> Self {
        Self {
            strategy,
            key: cipher::fix_key(key.as_bytes()),
            level,
        }
    }

    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Encode bytes into HTML-inert text.
    pub fn encode(&self, data: &[u8]) -> String {
        match self.strategy {
            Strategy::BitPack => {
                let compressed = compress::deflate(data, self.level);
                let enciphered = cipher::encrypt(&compressed, &self.key);
                transcode::pack(&enciphered)
            }
            Strategy::Wide => transcode::widen(data),
        }
    }

    /// Decode text produced by [`encode`](Self::encode) back to the
    /// original bytes. Any failure is fatal for the payload being decoded.
    pub fn decode(&self, text: &str) -> Result<Vec<u8>, CodecError> {
        match self.strategy {
            Strategy::BitPack => {
                let enciphered = transcode::unpack(text)?;
                let compressed = cipher::decrypt(&enciphered, &self.key)?;
                compress::inflate(&compressed)
            }
            Strategy::Wide => transcode::unwiden(text),
        }
    }

    /// Decode a payload known to hold UTF-8 text (script chunks, maps).
    pub fn decode_utf8(&self, text: &str) -> Result<String, CodecError> {
        Ok(String::from_utf8(self.decode(text)?)?)
    }

    /// Encode a UTF-8 string payload.
    pub fn encode_str(&self, text: &str) -> String {
        self.encode(text.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codecs() -> [Codec; 2] {
        [
            Codec::new(Strategy::BitPack, "k", DEFAULT_LEVEL),
            Codec::new(Strategy::Wide, "k", DEFAULT_LEVEL),
        ]
    }

    #[test]
    fn test_hello_world_roundtrip() {
        // Key "k", input "hello world": decode(encode(x)) == x.
        for codec in codecs() {
            let encoded = codec.encode_str("hello world");
            assert_eq!(codec.decode_utf8(&encoded).unwrap(), "hello world");
        }
    }

    #[test]
    fn test_roundtrip_misaligned_and_empty() {
        for codec in codecs() {
            for len in [0usize, 1, 2, 3, 5, 7, 37, 256] {
                let data: Vec<u8> = (0..len).map(|i| (i * 101 % 251) as u8).collect();
                let encoded = codec.encode(&data);
                assert_eq!(codec.decode(&encoded).unwrap(), data, "len {len}");
            }
        }
    }

    #[test]
    fn test_encoded_text_is_inert() {
        let data = b"<script>alert('</script>')</script>&amp;";
        for codec in codecs() {
            for chr in codec.encode(data).chars() {
                assert!(!chr.is_ascii());
            }
        }
    }

    #[test]
    fn test_wrong_key_fails_downstream_not_in_cipher() {
        let encode_side = Codec::new(Strategy::BitPack, "right-key", DEFAULT_LEVEL);
        let decode_side = Codec::new(Strategy::BitPack, "wrong-key", DEFAULT_LEVEL);
        let encoded = encode_side.encode(b"a payload long enough to compress and mangle");
        // No "bad key" error class exists; the damage shows up as a cipher
        // length or decompression failure.
        assert!(decode_side.decode(&encoded).is_err());
    }

    #[test]
    fn test_strategies_do_not_mix() {
        let bitpack = Codec::new(Strategy::BitPack, "k", DEFAULT_LEVEL);
        let wide = Codec::new(Strategy::Wide, "k", DEFAULT_LEVEL);
        let encoded = wide.encode(b"payload");
        // The bitpack repertoires and the wide range are disjoint enough
        // that cross-decoding reliably errors.
        assert!(bitpack.decode(&encoded).is_err());
    }

    #[test]
    fn test_payload_type_roundtrip() {
        for strategy in [Strategy::BitPack, Strategy::Wide] {
            let value = strategy.payload_type();
            assert_eq!(Strategy::from_payload_type(&value).unwrap(), strategy);
        }
        assert!(Strategy::from_payload_type("text/javascript").is_err());
    }

    #[test]
    fn test_default_key_is_a_documented_limitation() {
        // The default key ships in the artifact; pin it so a silent change
        // does not break previously packed artifacts.
        assert_eq!(DEFAULT_KEY, "your-key");
    }
}
