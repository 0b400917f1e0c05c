//! In-process lifecycle hooks.
//!
//! A host build system observes the packing pipeline through this
//! interface. Every method has a no-op default, so implementors pick
//! the phases they care about. The pipeline drives the calls; hook
//! implementations never control flow except by observing errors.

use serde_json::Value;
use std::path::Path;

use crate::debug;

/// Named lifecycle callbacks around a pack run.
pub trait BuildHooks {
    /// The hook set is attached to a pipeline.
    fn on_load(&mut self) {}

    /// Packing of `src` is about to start.
    fn on_before_build(&mut self, _src: &Path) {}

    /// Settings were parsed; the splash-screen strip is about to run.
    fn on_before_compress_settings(&mut self, _settings: &Value) {}

    /// Settings rewriting finished; `settings` is what gets embedded.
    fn on_after_compress_settings(&mut self, _settings: &Value) {}

    /// All payloads are encoded; the artifact markup is complete.
    fn on_after_build(&mut self, _src: &Path) {}

    /// The artifact file is about to be written.
    fn on_before_make(&mut self, _output: &Path) {}

    /// The artifact file is on disk.
    fn on_after_make(&mut self, _output: &Path) {}

    /// The run failed; called once with the error before it propagates.
    fn on_error(&mut self, _error: &anyhow::Error) {}

    /// The pipeline is done with the hook set, success or not.
    fn on_unload(&mut self) {}
}

/// Default hook set: logs each phase under `--verbose`, otherwise silent.
#[derive(Debug, Default)]
pub struct LoggingHooks;

impl BuildHooks for LoggingHooks {
    fn on_before_build(&mut self, src: &Path) {
        debug!("hook"; "before build: {}", src.display());
    }

    fn on_after_build(&mut self, src: &Path) {
        debug!("hook"; "after build: {}", src.display());
    }

    fn on_before_make(&mut self, output: &Path) {
        debug!("hook"; "before make: {}", output.display());
    }

    fn on_after_make(&mut self, output: &Path) {
        debug!("hook"; "after make: {}", output.display());
    }

    fn on_error(&mut self, error: &anyhow::Error) {
        debug!("hook"; "error: {error:#}");
    }
}
