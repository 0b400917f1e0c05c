//! Application settings and import map rewriting.
//!
//! The settings JSON ships inside the artifact, so the splash screen that
//! normally covers real network loading is pointless: its duration is
//! zeroed and its logo image dropped. The import map's engine specifier is
//! rewritten from a relative file path to the engine chunk's logical id.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

use super::chunk::chunk_id;

/// Settings after rewriting, plus what the assembler needs from them.
pub struct Settings {
    /// The rewritten JSON, embedded as the settings payload.
    pub json: Value,
    /// Script package paths discovered under `scripting.scriptPackages`.
    pub script_packages: Vec<String>,
}

/// Parse the settings JSON as found in the build.
pub fn parse_settings(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading settings {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing settings {}", path.display()))
}

/// Rewrite settings in place for embedding and return the script
/// package paths they declare.
pub fn compress_settings(json: &mut Value) -> Vec<String> {
    if let Some(splash) = json.get_mut("splashScreen").and_then(Value::as_object_mut) {
        splash.insert("totalTime".into(), Value::from(0));
        if let Some(logo) = splash.get_mut("logo").and_then(Value::as_object_mut) {
            logo.insert("base64".into(), Value::String(String::new()));
        }
    }

    json.get("scripting")
        .and_then(|s| s.get("scriptPackages"))
        .and_then(Value::as_array)
        .map(|packages| {
            packages
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Load and rewrite the settings JSON.
pub fn load_settings(path: &Path) -> Result<Settings> {
    let mut json = parse_settings(path)?;
    let script_packages = compress_settings(&mut json);
    Ok(Settings {
        json,
        script_packages,
    })
}

/// Rewrite the import map so specifiers pointing into the engine
/// directory resolve to logical chunk ids instead of files.
pub fn rewrite_import_map(path: &Path, engine_dir: &str) -> Result<String> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading import map {}", path.display()))?;
    let mut json: Value = serde_json::from_str(&text)
        .with_context(|| format!("parsing import map {}", path.display()))?;

    if let Some(imports) = json.get_mut("imports").and_then(Value::as_object_mut) {
        for value in imports.values_mut() {
            if let Some(target) = value.as_str()
                && let Some(name) = engine_chunk_name(target, engine_dir)
            {
                *value = Value::String(chunk_id(&name));
            }
        }
    }

    Ok(json.to_string())
}

/// The flat chunk name of an import-map target inside the engine
/// directory (`"./../cocos-js/cc.js"` -> `"cc.js"`), or `None` when the
/// target lives elsewhere.
fn engine_chunk_name(target: &str, engine_dir: &str) -> Option<String> {
    let (_, rest) = target.split_once(&format!("{engine_dir}/"))?;
    rest.rsplit('/').next().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn write_json(dir: &TempDir, name: &str, value: &Value) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, value.to_string()).unwrap();
        path
    }

    #[test]
    fn test_splash_screen_is_neutralized() {
        let dir = TempDir::new().unwrap();
        let path = write_json(
            &dir,
            "settings.json",
            &json!({
                "splashScreen": { "totalTime": 3000, "logo": { "base64": "AAAA" } },
                "scripting": { "scriptPackages": ["../temp/pkg/index.js"] }
            }),
        );
        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.json["splashScreen"]["totalTime"], 0);
        assert_eq!(settings.json["splashScreen"]["logo"]["base64"], "");
        assert_eq!(settings.script_packages, vec!["../temp/pkg/index.js"]);
    }

    #[test]
    fn test_settings_without_splash_or_packages() {
        let dir = TempDir::new().unwrap();
        let path = write_json(&dir, "settings.json", &json!({ "engine": {} }));
        let settings = load_settings(&path).unwrap();
        assert!(settings.script_packages.is_empty());
        assert_eq!(settings.json, json!({ "engine": {} }));
    }

    #[test]
    fn test_settings_survive_rewrite_structurally() {
        // Everything except the splash screen must be byte-for-byte
        // semantics-preserving: deep equality of untouched subtrees.
        let dir = TempDir::new().unwrap();
        let original = json!({
            "engine": { "debug": false, "macros": { "a": [1, 2, 3] } },
            "physics": null,
            "splashScreen": { "totalTime": 500 }
        });
        let path = write_json(&dir, "settings.json", &original);
        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.json["engine"], original["engine"]);
        assert_eq!(settings.json["physics"], original["physics"]);
        assert_eq!(settings.json["splashScreen"]["totalTime"], 0);
    }

    #[test]
    fn test_import_map_engine_rewrite() {
        let dir = TempDir::new().unwrap();
        let path = write_json(
            &dir,
            "import-map.json",
            &json!({
                "imports": {
                    "cc": "./../cocos-js/cc.js",
                    "app": "./app.js"
                }
            }),
        );
        let rewritten = rewrite_import_map(&path, "cocos-js").unwrap();
        let json: Value = serde_json::from_str(&rewritten).unwrap();
        assert_eq!(json["imports"]["cc"], "chunks:///cc.js");
        assert_eq!(json["imports"]["app"], "./app.js");
    }
}
