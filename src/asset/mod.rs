//! Asset classification and serialization.
//!
//! Scans a build output tree and turns every loose file into an in-memory
//! record keyed by its forward-slash relative path. Text-safe files keep
//! their literal UTF-8 content; everything else is base64. The resulting
//! maps are built once, embedded into the artifact as JSON, and read-only
//! from then on.

mod kind;
mod scan;

pub use kind::{PayloadKind, extension_of};
pub use scan::scan_assets;

use rustc_hash::FxHashMap;
use serde_json::{Map, Value};

/// One classified file, ready for embedding.
#[derive(Debug, Clone)]
pub struct AssetRecord {
    /// Forward-slash relative path, the lookup key at runtime.
    pub key: String,
    /// Literal UTF-8 text or base64, depending on `kind`.
    pub payload: String,
    pub kind: PayloadKind,
}

/// The two embedded maps: general assets and wasm binaries.
///
/// A `.wasm` file appears only in `wasm`, never in `assets` — the resource
/// provider is the sole consumer of wasm bytes.
#[derive(Debug, Default)]
pub struct AssetMaps {
    pub assets: FxHashMap<String, AssetRecord>,
    pub wasm: FxHashMap<String, AssetRecord>,
}

impl AssetMaps {
    /// Insert a record into the map its kind belongs to.
    pub fn insert(&mut self, record: AssetRecord) {
        let map = match record.kind {
            PayloadKind::Wasm => &mut self.wasm,
            _ => &mut self.assets,
        };
        map.insert(record.key.clone(), record);
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty() && self.wasm.is_empty()
    }

    pub fn len(&self) -> usize {
        self.assets.len() + self.wasm.len()
    }

    /// The general asset map as a JSON object (key -> payload string).
    pub fn assets_json(&self) -> String {
        to_json(&self.assets)
    }

    /// The wasm map as a JSON object (key -> base64 string).
    pub fn wasm_json(&self) -> String {
        to_json(&self.wasm)
    }
}

fn to_json(map: &FxHashMap<String, AssetRecord>) -> String {
    // Sort keys so the artifact is byte-stable across runs.
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    let mut object = Map::with_capacity(map.len());
    for key in keys {
        object.insert(key.clone(), Value::String(map[key].payload.clone()));
    }
    Value::Object(object).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(key: &str, payload: &str, kind: PayloadKind) -> AssetRecord {
        AssetRecord {
            key: key.to_string(),
            payload: payload.to_string(),
            kind,
        }
    }

    #[test]
    fn test_wasm_goes_only_to_the_wasm_map() {
        let mut maps = AssetMaps::default();
        maps.insert(record("engine.wasm", "AAAA", PayloadKind::Wasm));
        maps.insert(record("cfg.json", "{}", PayloadKind::Text));
        assert!(maps.assets.contains_key("cfg.json"));
        assert!(!maps.assets.contains_key("engine.wasm"));
        assert!(maps.wasm.contains_key("engine.wasm"));
        assert_eq!(maps.len(), 2);
    }

    #[test]
    fn test_json_output_is_key_sorted() {
        let mut maps = AssetMaps::default();
        maps.insert(record("b.txt", "two", PayloadKind::Text));
        maps.insert(record("a.txt", "one", PayloadKind::Text));
        assert_eq!(maps.assets_json(), r#"{"a.txt":"one","b.txt":"two"}"#);
    }
}
