//! Hook system around packing.
//!
//! Two kinds of hooks coexist:
//! - `lifecycle`: the in-process [`BuildHooks`] observer interface a
//!   host build system implements (before/after build, around settings
//!   compression, around artifact make, error, unload).
//! - `runner`: external `[build.hooks]` pre/post commands from the
//!   config, run with `$ONEPACK_*` environment variables.

mod lifecycle;
mod runner;

pub use lifecycle::{BuildHooks, LoggingHooks};
pub use runner::{build_onepack_vars, resolve_args, run_hook, run_post_hooks, run_pre_hooks};
