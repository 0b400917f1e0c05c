//! Command-line interface.
//!
//! This module provides:
//! - `args`: clap definitions (`Cli`, `Commands`)
//! - `pack`: the packing pipeline
//! - `inspect`: payload listing for an existing artifact
//! - `extract`: drain an artifact back to files on disk

mod args;
pub mod extract;
pub mod inspect;
pub mod pack;

pub use args::{Cli, Commands, PackArgs};
