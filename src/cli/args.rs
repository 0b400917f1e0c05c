//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::codec::Strategy;

/// onepack single-file HTML packer CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: onepack.toml)
    #[arg(short = 'C', long, default_value = "onepack.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Pack a web build into a single self-contained HTML artifact
    #[command(visible_alias = "p")]
    Pack {
        #[command(flatten)]
        pack_args: PackArgs,
    },

    /// List the payload blocks of an existing artifact
    #[command(visible_alias = "i")]
    Inspect {
        /// Artifact path
        #[arg(value_hint = clap::ValueHint::FilePath)]
        artifact: PathBuf,
    },

    /// Drain an artifact back to decoded chunks and maps on disk
    #[command(visible_alias = "x")]
    Extract {
        /// Artifact path
        #[arg(value_hint = clap::ValueHint::FilePath)]
        artifact: PathBuf,

        /// Destination directory
        #[arg(short, long, default_value = "extracted", value_hint = clap::ValueHint::DirPath)]
        out_dir: PathBuf,

        /// Cipher key (default: the config's [codec] key)
        #[arg(short, long)]
        key: Option<String>,

        /// Enable verbose output for debugging
        #[arg(short = 'V', long)]
        verbose: bool,
    },
}

/// Pack command arguments
#[derive(clap::Args, Debug, Clone)]
pub struct PackArgs {
    /// Web build directory to pack (relative to project root)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub src: Option<PathBuf>,

    /// Artifact output path
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Cipher key embedded in the artifact (obfuscation only)
    #[arg(short, long)]
    pub key: Option<String>,

    /// Codec strategy: bitpack or wide
    #[arg(long)]
    pub strategy: Option<Strategy>,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}
