//! Artifact inspection: list the payload blocks without decoding them.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::log;
use crate::runtime::{artifact_strategy, enumerate_payloads};

pub fn run_inspect(artifact: &Path) -> Result<()> {
    let html = fs::read_to_string(artifact)
        .with_context(|| format!("reading artifact {}", artifact.display()))?;
    let blocks = enumerate_payloads(&html)?;

    let Some(strategy) = artifact_strategy(&blocks) else {
        log!("inspect"; "no payload blocks in {}", artifact.display());
        return Ok(());
    };

    log!(
        "inspect";
        "{}: {} payload blocks, strategy {}",
        artifact.display(),
        blocks.len(),
        strategy
    );
    for block in &blocks {
        let srctype = block.srctype.as_deref().unwrap_or("-");
        println!(
            "  #{:<3} {:<10} srctype={:<20} {} chars",
            block.position,
            block.kind,
            srctype,
            block.encoded.chars().count()
        );
    }
    Ok(())
}
