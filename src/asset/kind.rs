//! Payload kind classification.
//!
//! The decision is extension-driven and deterministic: the same path with
//! the same config always classifies the same way, independent of file
//! contents. Wasm is its own kind because wasm bytes never enter the main
//! asset map — they live in a separate map served by the resource provider.

use crate::config::AssetsConfig;
use std::path::Path;

/// How a file's bytes are carried inside the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// Stored as literal UTF-8 text.
    Text,
    /// Stored base64-encoded (standard alphabet).
    Binary,
    /// Stored base64-encoded in the dedicated wasm map.
    Wasm,
}

impl PayloadKind {
    /// Classify a file by its extension against the configured allow-lists.
    ///
    /// Files without an extension are binary: nothing identifies their
    /// content as text, and base64 is always safe.
    pub fn classify(path: &Path, config: &AssetsConfig) -> Self {
        let Some(ext) = extension_of(path) else {
            return Self::Binary;
        };
        if ext == config.wasm_extension {
            Self::Wasm
        } else if config.is_text_extension(&ext) || config.is_script_extension(&ext) {
            Self::Text
        } else {
            Self::Binary
        }
    }
}

/// Extension of a path in `.ext` form, lowercased.
///
/// The leading dot matches how handler registries and config lists key
/// extensions, so lookups never have to normalize twice.
pub fn extension_of(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?;
    Some(format!(".{}", ext.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssetsConfig;

    fn config() -> AssetsConfig {
        AssetsConfig::default()
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of(Path::new("a/b/c.PNG")).unwrap(), ".png");
        assert_eq!(extension_of(Path::new("file.ExportJson")).unwrap(), ".exportjson");
        assert_eq!(extension_of(Path::new("no-extension")), None);
    }

    #[test]
    fn test_text_extensions_classify_as_text() {
        let cfg = config();
        for name in ["cfg.json", "atlas.plist", "level.tmx", "shader.vsh", "font.fnt"] {
            assert_eq!(
                PayloadKind::classify(Path::new(name), &cfg),
                PayloadKind::Text,
                "{name}"
            );
        }
    }

    #[test]
    fn test_binary_extensions_classify_as_binary() {
        let cfg = config();
        for name in ["sprite.png", "music.mp3", "model.bin", "clip.mp4"] {
            assert_eq!(
                PayloadKind::classify(Path::new(name), &cfg),
                PayloadKind::Binary,
                "{name}"
            );
        }
    }

    #[test]
    fn test_wasm_is_its_own_kind() {
        assert_eq!(
            PayloadKind::classify(Path::new("engine/physics.wasm"), &config()),
            PayloadKind::Wasm
        );
    }

    #[test]
    fn test_no_extension_is_binary() {
        assert_eq!(
            PayloadKind::classify(Path::new("LICENSE"), &config()),
            PayloadKind::Binary
        );
    }

    #[test]
    fn test_classification_is_deterministic() {
        let cfg = config();
        let first = PayloadKind::classify(Path::new("data/config.json"), &cfg);
        for _ in 0..3 {
            assert_eq!(PayloadKind::classify(Path::new("data/config.json"), &cfg), first);
        }
    }
}
