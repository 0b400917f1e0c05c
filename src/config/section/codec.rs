//! `[codec]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [codec]
//! key = "my-project-key"   # obfuscation only: the key ships in the artifact
//! strategy = "bitpack"     # bitpack | wide
//! level = 9                # deflate level, 0-9
//! ```

use serde::{Deserialize, Serialize};

use crate::codec::{Codec, DEFAULT_KEY, DEFAULT_LEVEL, Strategy};
use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Cipher key. Embedded verbatim in the artifact's bootstrap script,
    /// so it deters casual inspection and nothing more.
    pub key: String,

    /// Transcoding strategy recorded in every payload element.
    pub strategy: Strategy,

    /// Deflate compression level (0-9).
    pub level: u32,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_KEY.into(),
            strategy: Strategy::default(),
            level: DEFAULT_LEVEL,
        }
    }
}

impl CodecConfig {
    pub fn codec(&self) -> Codec {
        Codec::new(self.strategy, &self.key, self.level)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.key.is_empty() {
            diag.error_with_hint(
                FieldPath::new("codec.key"),
                "key must not be empty",
                "remove the field to use the default key",
            );
        }
        if self.level > 9 {
            diag.error(
                FieldPath::new("codec.level"),
                format!("level {} out of range (0-9)", self.level),
            );
        }
        if self.key == DEFAULT_KEY {
            diag.hint(
                FieldPath::new("codec.key"),
                "using the default key; set your own to change the obfuscation",
            );
        }
    }
}
