//! Global config with atomic replacement.
//!
//! `arc-swap` gives lock-free reads from every worker thread while the CLI
//! installs the loaded config exactly once at startup.

use crate::config::PackConfig;
use arc_swap::ArcSwap;
use std::sync::{Arc, LazyLock};

static CONFIG: LazyLock<ArcSwap<PackConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(PackConfig::default()));

#[inline]
pub fn cfg() -> Arc<PackConfig> {
    CONFIG.load_full()
}

#[inline]
pub fn init_config(config: PackConfig) -> Arc<PackConfig> {
    let arc = Arc::new(config);
    CONFIG.store(Arc::clone(&arc));
    arc
}
