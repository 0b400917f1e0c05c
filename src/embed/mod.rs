//! Embedded static resources.
//!
//! The browser bootstrap (decoder + runtime context) ships inside the
//! binary, minified at build time, and is rendered with the key and
//! strategy before being emitted into the artifact.
//!
//! # Usage
//!
//! ```ignore
//! use embed::{BOOTSTRAP_JS, BootstrapVars};
//!
//! let js = BOOTSTRAP_JS.render(&BootstrapVars::new("my-key", Strategy::BitPack));
//! ```

mod template;

pub use template::{Template, TemplateVars};

use crate::codec::Strategy;

/// Variables for bootstrap.js.
pub struct BootstrapVars<'a> {
    pub key: &'a str,
    pub strategy: Strategy,
}

impl<'a> BootstrapVars<'a> {
    pub fn new(key: &'a str, strategy: Strategy) -> Self {
        Self { key, strategy }
    }
}

impl TemplateVars for BootstrapVars<'_> {
    fn apply(&self, content: &str) -> String {
        // Both placeholders sit in expression position; JSON-encode so any
        // key survives quoting.
        content
            .replace(
                "__ONEPACK_KEY__",
                &serde_json::to_string(self.key).unwrap_or_else(|_| "\"\"".into()),
            )
            .replace(
                "__ONEPACK_STRATEGY__",
                &serde_json::to_string(self.strategy.as_str()).unwrap_or_else(|_| "\"\"".into()),
            )
    }
}

/// In-browser decoder and runtime context, minified at build time.
pub const BOOTSTRAP_JS: Template<BootstrapVars<'static>> =
    Template::new(include_str!(concat!(env!("OUT_DIR"), "/bootstrap.min.js")));
