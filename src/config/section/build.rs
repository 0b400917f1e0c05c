//! `[build]` section configuration.
//!
//! Paths into the web build being packed and the artifact location. All
//! paths are relative to the project root in the config file; they are
//! normalized to absolute paths at load time.
//!
//! # Example
//!
//! ```toml
//! [build]
//! src = "build/web-mobile"        # web build to pack
//! output = "index.single.html"    # artifact (written next to src, never inside it)
//! page = "index.html"             # source page inside src
//! entry = "index.js"              # entry chunk, imported last
//! application = "application.js"  # application bootstrap chunk
//! engine = "cocos-js"             # engine chunk + wasm directory inside src
//! settings = "src/settings.json"  # application settings inside src
//! import_map = "src/import-map.json"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::hooks::HooksConfig;
use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Web build directory to pack.
    pub src: PathBuf,

    /// Artifact path. The source tree is never mutated; everything the
    /// artifact needs is read from `src` and written here.
    pub output: PathBuf,

    /// Source page inside `src`.
    pub page: PathBuf,

    /// Entry chunk name; its logical id is imported last.
    pub entry: String,

    /// Application bootstrap chunk name.
    pub application: String,

    /// Engine directory inside `src` (chunks and wasm binaries).
    pub engine: PathBuf,

    /// Application settings JSON inside `src`.
    pub settings: PathBuf,

    /// SystemJS import map inside `src`.
    pub import_map: PathBuf,

    /// External command hooks around packing.
    pub hooks: HooksConfig,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            src: "build".into(),
            output: "index.single.html".into(),
            page: "index.html".into(),
            entry: "index.js".into(),
            application: "application.js".into(),
            engine: "cocos-js".into(),
            settings: "src/settings.json".into(),
            import_map: "src/import-map.json".into(),
            hooks: HooksConfig::default(),
        }
    }
}

impl BuildConfig {
    /// Absolute paths resolved against the project root (`src` and
    /// `output` only; the rest stay relative to `src`).
    pub fn normalize(&mut self, root: &Path) {
        self.src = crate::utils::path::normalize_path(&root.join(&self.src));
        self.output = crate::utils::path::normalize_path(&root.join(&self.output));
    }

    pub fn page_path(&self) -> PathBuf {
        self.src.join(&self.page)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.src.join(&self.settings)
    }

    pub fn import_map_path(&self) -> PathBuf {
        self.src.join(&self.import_map)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.entry.is_empty() {
            diag.error(FieldPath::new("build.entry"), "entry chunk name is empty");
        }
        if self.output.starts_with(&self.src) {
            diag.error_with_hint(
                FieldPath::new("build.output"),
                "artifact path lies inside the build tree",
                "a later scan would embed the artifact into itself",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = BuildConfig::default();
        assert_eq!(cfg.entry, "index.js");
        assert_eq!(cfg.engine, PathBuf::from("cocos-js"));
        assert_eq!(cfg.settings, PathBuf::from("src/settings.json"));
    }

    #[test]
    fn test_output_inside_src_is_rejected() {
        let mut cfg = BuildConfig::default();
        cfg.normalize(Path::new("/project"));
        cfg.output = cfg.src.join("index.single.html");
        let mut diag = ConfigDiagnostics::new();
        cfg.validate(&mut diag);
        assert!(diag.has_errors());
    }
}
