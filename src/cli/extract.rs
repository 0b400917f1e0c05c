//! Artifact extraction: drain the payloads back to files on disk.
//!
//! Script chunks land under `chunks/` in drain order; the asset and wasm
//! maps and the settings become JSON files next to them. Useful for
//! diffing an artifact against the build it was packed from.

use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::codec::Codec;
use crate::config::cfg;
use crate::log;
use crate::runtime::{Loader, ScriptSink, artifact_strategy, enumerate_payloads};
use rustc_hash::FxHashMap;

/// A sink that writes every executed script to disk instead of running it.
struct FileSink {
    out_dir: PathBuf,
    written: usize,
}

impl FileSink {
    fn new(out_dir: &Path) -> Self {
        Self {
            out_dir: out_dir.to_path_buf(),
            written: 0,
        }
    }
}

impl ScriptSink for FileSink {
    fn exec(&mut self, source: &str, srctype: Option<&str>) -> Result<()> {
        let path = if srctype == Some("systemjs-importmap") {
            self.out_dir.join("import-map.json")
        } else {
            self.written += 1;
            self.out_dir.join(format!("chunks/{:03}.js", self.written))
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::write(&path, source).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

pub fn run_extract(artifact: &Path, out_dir: &Path, key: Option<&str>) -> Result<()> {
    let config = cfg();
    let html = fs::read_to_string(artifact)
        .with_context(|| format!("reading artifact {}", artifact.display()))?;
    let blocks = enumerate_payloads(&html)?;

    let strategy = artifact_strategy(&blocks)
        .ok_or_else(|| anyhow!("no payload blocks in {}", artifact.display()))?;
    let key = key.unwrap_or(&config.codec.key);
    let codec = Codec::new(strategy, key, config.codec.level);

    fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;

    let mut loader = Loader::new(codec, FileSink::new(out_dir));
    let ctx = loader
        .drain(&blocks)
        .with_context(|| "draining payloads (wrong key?)".to_string())?;
    let sink = loader.into_sink();

    write_map(&out_dir.join("assets.json"), &ctx.assets)?;
    if !ctx.wasm.is_empty() {
        write_map(&out_dir.join("wasm.json"), &ctx.wasm)?;
    }
    if let Some(settings) = &ctx.settings {
        write_json(&out_dir.join("settings.json"), settings)?;
    }

    log!(
        "extract";
        "{} chunks, {} assets, {} wasm -> {}",
        sink.written,
        ctx.assets.len(),
        ctx.wasm.len(),
        out_dir.display()
    );
    Ok(())
}

/// Dump a payload map with sorted keys so extractions diff cleanly.
fn write_map(path: &Path, map: &FxHashMap<String, String>) -> Result<()> {
    let sorted: BTreeMap<&String, &String> = map.iter().collect();
    let text = serde_json::to_string_pretty(&sorted)?;
    fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

fn write_json(path: &Path, value: &Value) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_sink_numbers_chunks_and_splits_import_map() {
        let dir = TempDir::new().unwrap();
        let mut sink = FileSink::new(dir.path());
        sink.exec("System.register([], function () {});", None).unwrap();
        sink.exec("{\"imports\":{}}", Some("systemjs-importmap")).unwrap();
        sink.exec("System.register([], function () {});", None).unwrap();

        assert!(dir.path().join("chunks/001.js").is_file());
        assert!(dir.path().join("chunks/002.js").is_file());
        assert!(dir.path().join("import-map.json").is_file());
        assert_eq!(sink.written, 2);
    }
}
