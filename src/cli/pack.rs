//! The pack pipeline: scan, assemble, write.

use anyhow::{Context, Result};
use std::fs;
use std::time::Instant;

use crate::asset::scan_assets;
use crate::assemble::assemble;
use crate::config::{PackConfig, cfg};
use crate::hooks::{BuildHooks, LoggingHooks, run_post_hooks, run_pre_hooks};
use crate::log;

/// Run a full pack with the default hook set, against the installed
/// global config.
pub fn run_pack() -> Result<()> {
    let config = cfg();
    let mut hooks = LoggingHooks;
    run_pack_with_hooks(&config, &mut hooks)
}

/// Run a full pack, driving the given lifecycle hooks.
///
/// `on_load`/`on_unload` bracket the run; `on_error` fires once with the
/// failure before it propagates.
pub fn run_pack_with_hooks(config: &PackConfig, hooks: &mut dyn BuildHooks) -> Result<()> {
    hooks.on_load();
    let result = pipeline(config, hooks);
    if let Err(error) = &result {
        hooks.on_error(error);
    }
    hooks.on_unload();
    result
}

fn pipeline(config: &PackConfig, hooks: &mut dyn BuildHooks) -> Result<()> {
    let started = Instant::now();
    let build = &config.build;

    run_pre_hooks(config)?;
    hooks.on_before_build(&build.src);
    log!("pack"; "packing {}", build.src.display());

    let maps = scan_assets(&build.src, &build.engine, &config.assets)?;
    log!(
        "pack";
        "{} assets embedded ({} wasm)",
        maps.assets.len(),
        maps.wasm.len()
    );

    let artifact = assemble(config, &maps, hooks)?;
    hooks.on_after_build(&build.src);

    hooks.on_before_make(&build.output);
    if let Some(parent) = build.output.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(&build.output, &artifact)
        .with_context(|| format!("writing {}", build.output.display()))?;
    hooks.on_after_make(&build.output);

    run_post_hooks(config)?;

    log!(
        "pack";
        "{} written ({}) in {:.2}s",
        build.output.display(),
        human_size(artifact.len()),
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Human-readable byte count for the summary line.
fn human_size(bytes: usize) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = 1024.0 * 1024.0;
    let bytes = bytes as f64;
    if bytes >= MIB {
        format!("{:.1} MiB", bytes / MIB)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes / KIB)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_size_units() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KiB");
        assert_eq!(human_size(3 * 1024 * 1024 + 512 * 1024), "3.5 MiB");
    }
}
