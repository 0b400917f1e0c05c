//! Project configuration management for `onepack.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── build      # [build] and [build.hooks]
//! │   ├── codec      # [codec]
//! │   └── assets     # [assets]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, ConfigDiagnostics
//! │   └── handle     # Global config handle
//! └── mod.rs         # PackConfig (this file)
//! ```

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{AssetsConfig, BuildConfig, CodecConfig, HookConfig, HooksConfig};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath, cfg, init_config};

use crate::cli::{Cli, Commands, PackArgs};
use crate::log;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing onepack.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Build tree paths and artifact location
    pub build: BuildConfig,

    /// Codec key, strategy and compression level
    pub codec: CodecConfig,

    /// Classification allow-lists
    pub assets: AssetsConfig,
}

impl PackConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd for the config file; a missing file falls
    /// back to defaults rooted at cwd so `inspect`/`extract` work on bare
    /// artifacts without a project.
    pub fn load(cli: &Cli) -> Result<Self> {
        let (config_path, exists) = match find_config_file(&cli.config) {
            Some(path) => (path, true),
            None => (
                std::env::current_dir()?.join(&cli.config),
                false,
            ),
        };

        let mut config = if exists {
            Self::from_path(&config_path)?
        } else {
            if matches!(cli.command, Commands::Pack { .. }) {
                log!(
                    "hint";
                    "no '{}' found, using defaults",
                    cli.config.display()
                );
            }
            Self::default()
        };

        let root = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        config.config_path = config_path;
        config.root = crate::utils::path::normalize_path(&root);
        config.apply_command_options(cli);
        config.build.normalize(&config.root.clone());
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        eprintln!();
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {field}");
        }
        eprintln!();
    }

    pub fn get_root(&self) -> &Path {
        &self.root
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, cli: &Cli) {
        if let Commands::Pack { pack_args } = &cli.command {
            self.apply_pack_args(pack_args);
        }
    }

    fn apply_pack_args(&mut self, args: &PackArgs) {
        crate::logger::set_verbose(args.verbose);

        Self::update_option(&mut self.build.src, args.src.as_ref());
        Self::update_option(&mut self.build.output, args.output.as_ref());
        Self::update_option(&mut self.codec.key, args.key.as_ref());
        if let Some(strategy) = args.strategy {
            self.codec.strategy = strategy;
        }
    }

    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate configuration, collecting all errors before failing.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.build.validate(&mut diag);
        self.codec.validate(&mut diag);
        self.assets.validate(&mut diag);

        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

/// Parse config from a TOML fragment. Panics on unknown fields to catch
/// typos in tests.
#[cfg(test)]
pub fn test_parse_config(extra: &str) -> PackConfig {
    let (parsed, ignored) = PackConfig::parse_with_ignored(extra).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Strategy;

    #[test]
    fn test_from_str_invalid_toml() {
        let result: Result<PackConfig, _> = toml::from_str("[build\nsrc = \"web\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_defaults() {
        let config = PackConfig::default();
        assert_eq!(config.build.src, PathBuf::from("build"));
        assert_eq!(config.codec.strategy, Strategy::BitPack);
        assert_eq!(config.assets.dir, PathBuf::from("assets"));
    }

    #[test]
    fn test_sections_parse() {
        let config = test_parse_config(
            r#"
[build]
src = "dist/web-mobile"
entry = "main.js"

[codec]
key = "game-key"
strategy = "wide"
"#,
        );
        assert_eq!(config.build.src, PathBuf::from("dist/web-mobile"));
        assert_eq!(config.build.entry, "main.js");
        assert_eq!(config.codec.key, "game-key");
        assert_eq!(config.codec.strategy, Strategy::Wide);
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[build]\nsrc = \"web\"\n[mystery]\nfield = 1";
        let (config, ignored) = PackConfig::parse_with_ignored(content).unwrap();
        assert_eq!(config.build.src, PathBuf::from("web"));
        assert!(ignored.iter().any(|f| f.contains("mystery")));
    }

    #[test]
    fn test_no_unknown_fields() {
        let (_, ignored) = PackConfig::parse_with_ignored("[codec]\nlevel = 6").unwrap();
        assert!(ignored.is_empty());
    }
}
