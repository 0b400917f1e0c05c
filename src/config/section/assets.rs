//! `[assets]` section configuration.
//!
//! Controls which files the scanner treats as text-safe and where the
//! asset tree lives inside the web build.
//!
//! # Example
//!
//! ```toml
//! [assets]
//! dir = "assets"                  # asset tree inside the build (relative)
//! text_extensions = [".json", ".atlas"]   # extends the built-in list
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Extensions whose content is embedded as literal UTF-8.
const TEXT_EXTENSIONS: &[&str] = &[
    ".txt",
    ".xml",
    ".vsh",
    ".fsh",
    ".atlas",
    ".tmx",
    ".tsx",
    ".json",
    ".exportjson",
    ".plist",
    ".fnt",
    ".rt",
    ".mtl",
    ".pmtl",
    ".prefab",
    ".log",
];

/// Script-shaped extensions, also embedded as text.
const SCRIPT_EXTENSIONS: &[&str] = &[".js", ".effect", ".chunk"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Asset tree inside the web build, relative to `[build] src`.
    pub dir: PathBuf,

    /// Extra text-safe extensions on top of the built-in list.
    pub text_extensions: Vec<String>,

    /// Extra script extensions on top of the built-in list.
    pub script_extensions: Vec<String>,

    /// Extension routed to the dedicated wasm map.
    pub wasm_extension: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            dir: "assets".into(),
            text_extensions: Vec::new(),
            script_extensions: Vec::new(),
            wasm_extension: ".wasm".into(),
        }
    }
}

impl AssetsConfig {
    /// Whether `ext` (in `.ext` form, lowercase) embeds as literal text.
    pub fn is_text_extension(&self, ext: &str) -> bool {
        TEXT_EXTENSIONS.contains(&ext) || self.text_extensions.iter().any(|e| matches(e, ext))
    }

    /// Whether `ext` is a script suffix (also embedded as text).
    pub fn is_script_extension(&self, ext: &str) -> bool {
        SCRIPT_EXTENSIONS.contains(&ext) || self.script_extensions.iter().any(|e| matches(e, ext))
    }

    /// Paths here stay relative: they are joined to the build directory
    /// at scan time, so absolute or escaping paths are config errors.
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        for comp in self.dir.components() {
            let reason = match comp {
                Component::ParentDir => Some("parent directory '..' not allowed"),
                Component::Prefix(_) | Component::RootDir => Some("absolute paths not allowed"),
                _ => None,
            };
            if let Some(reason) = reason {
                diag.error(
                    FieldPath::new("assets.dir"),
                    format!("path '{}': {reason}", self.dir.display()),
                );
            }
        }
        if !self.wasm_extension.starts_with('.') {
            diag.error_with_hint(
                FieldPath::new("assets.wasm_extension"),
                format!("'{}' must start with a dot", self.wasm_extension),
                "write it like \".wasm\"",
            );
        }
    }
}

/// Config entries may be written with or without the leading dot.
fn matches(configured: &str, ext: &str) -> bool {
    let configured = configured.strip_prefix('.').unwrap_or(configured);
    let ext = ext.strip_prefix('.').unwrap_or(ext);
    configured.eq_ignore_ascii_case(ext)
}
