//! `[build.hooks]` configuration.
//!
//! External commands run around the packing pipeline, with `$ONEPACK_*`
//! variables substituted from the resolved config.
//!
//! # Example
//!
//! ```toml
//! [[build.hooks.pre]]
//! command = ["npm", "run", "build"]
//!
//! [[build.hooks.post]]
//! command = ["du", "-h", "$ONEPACK_OUTPUT"]
//! quiet = false
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HooksConfig {
    /// Commands run before scanning the build tree.
    pub pre: Vec<HookConfig>,
    /// Commands run after the artifact is written.
    pub post: Vec<HookConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HookConfig {
    /// Whether this hook runs (default: true).
    pub enable: bool,

    /// Display name for logging (defaults to command[0]).
    pub name: Option<String>,

    /// Command and arguments. Supports `$ONEPACK_*` substitution.
    pub command: Vec<String>,

    /// Suppress the command's stdout (default: true).
    pub quiet: bool,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            enable: true,
            name: None,
            command: Vec::new(),
            quiet: true,
        }
    }
}

impl HookConfig {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .unwrap_or_else(|| self.command.first().map(String::as_str).unwrap_or("hook"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let hooks: HooksConfig = toml::from_str("").unwrap();
        assert!(hooks.pre.is_empty());
        assert!(hooks.post.is_empty());
    }

    #[test]
    fn test_pre_hook() {
        let hooks: HooksConfig = toml::from_str(
            r#"
[[pre]]
command = ["npm", "run", "build"]
"#,
        )
        .unwrap();
        assert_eq!(hooks.pre.len(), 1);
        assert_eq!(hooks.pre[0].display_name(), "npm");
        assert!(hooks.pre[0].quiet);
    }
}
