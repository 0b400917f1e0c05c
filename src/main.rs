//! onepack - packs a multi-file web build into one self-contained HTML file.

#![allow(dead_code)]

mod assemble;
mod asset;
mod cli;
mod codec;
mod config;
mod embed;
mod hooks;
mod logger;
mod runtime;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::{PackConfig, init_config};

fn main() -> Result<()> {
    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    init_config(PackConfig::load(cli)?);

    match &cli.command {
        Commands::Pack { .. } => cli::pack::run_pack(),
        Commands::Inspect { artifact } => cli::inspect::run_inspect(artifact),
        Commands::Extract {
            artifact,
            out_dir,
            key,
            verbose,
        } => {
            logger::set_verbose(*verbose);
            cli::extract::run_extract(artifact, out_dir, key.as_deref())
        }
    }
}
