//! Build-tree scanning.
//!
//! Collects every loose file under the asset directory (and every `.wasm`
//! under the engine directory), reads them in parallel, and classifies each
//! into the embedded maps. The scan is all-or-nothing: one unreadable file
//! or directory fails the whole run, so a partial map never reaches the
//! artifact.

use anyhow::{Context, Result, anyhow};
use jwalk::WalkDir;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

use super::{AssetMaps, AssetRecord, PayloadKind};
use crate::config::AssetsConfig;
use crate::utils::path::relative_key;

pub const IGNORED_FILE_NAMES: &[&str] = &[".DS_Store", "Thumbs.db"];

/// Scan the build tree into the two embedded maps.
///
/// Asset keys are relative to `build_dir` (so they keep the asset
/// directory prefix, matching the URLs the application requests). Wasm
/// keys are relative to `wasm_dir`, the names the resource provider is
/// asked for.
pub fn scan_assets(build_dir: &Path, wasm_dir: &Path, config: &AssetsConfig) -> Result<AssetMaps> {
    let asset_root = build_dir.join(&config.dir);
    let wasm_root = build_dir.join(wasm_dir);

    let mut records = read_records(&asset_root, build_dir, config, |kind| {
        // Wasm under the asset directory still belongs to the wasm map,
        // but keyed like the rest of the assets.
        matches!(kind, PayloadKind::Text | PayloadKind::Binary | PayloadKind::Wasm)
    })?;
    if wasm_root.is_dir() {
        records.extend(read_records(&wasm_root, &wasm_root, config, |kind| {
            kind == PayloadKind::Wasm
        })?);
    }

    let mut maps = AssetMaps::default();
    for record in records {
        maps.insert(record);
    }
    Ok(maps)
}

fn read_records<F>(
    root: &Path,
    key_base: &Path,
    config: &AssetsConfig,
    wanted: F,
) -> Result<Vec<AssetRecord>>
where
    F: Fn(PayloadKind) -> bool + Sync,
{
    let mut files = collect_files(root)?;
    files.sort();

    files
        .par_iter()
        .filter_map(|path| {
            let kind = PayloadKind::classify(path, config);
            if !wanted(kind) {
                return None;
            }
            Some(read_record(path, key_base, kind))
        })
        .collect()
}

/// Every regular file under `root`, ignoring OS litter. Walk errors are
/// fatal — a directory we cannot enumerate means an incomplete map.
fn collect_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.with_context(|| format!("scanning {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_str().unwrap_or_default().to_string();
        if IGNORED_FILE_NAMES.contains(&name.as_str()) {
            continue;
        }
        files.push(entry.path());
    }
    Ok(files)
}

fn read_record(path: &Path, key_base: &Path, kind: PayloadKind) -> Result<AssetRecord> {
    let key = relative_key(path, key_base)
        .ok_or_else(|| anyhow!("asset path escapes the scan root: {}", path.display()))?;
    let payload = match kind {
        PayloadKind::Text => fs::read_to_string(path)
            .with_context(|| format!("reading text asset {}", path.display()))?,
        PayloadKind::Binary | PayloadKind::Wasm => {
            use base64::Engine as _;
            let bytes = fs::read(path)
                .with_context(|| format!("reading binary asset {}", path.display()))?;
            base64::engine::general_purpose::STANDARD.encode(bytes)
        }
    };
    Ok(AssetRecord { key, payload, kind })
}
