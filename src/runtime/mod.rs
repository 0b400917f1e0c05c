//! Runtime layer: everything that happens after an artifact is loaded.
//!
//! The browser runs the embedded bootstrap; this module is the same
//! machinery as a testable Rust surface. [`document`] enumerates payload
//! blocks of an artifact in document order, [`loader`] drains them
//! strictly sequentially into a [`RuntimeContext`], and [`resolve`]
//! serves typed asset requests from the populated context without any
//! network I/O.
//!
//! Redesigned away from ambient state: the context is an explicit value
//! constructed once by the drain and passed by reference everywhere.

mod bundle;
mod document;
mod font;
mod loader;
mod page;
mod provider;
mod resolve;

pub use bundle::BundleJoin;
pub use document::{PayloadBlock, artifact_strategy, enumerate_payloads};
pub use font::{FAMILY_SUFFIX, family_name, font_face_source, font_format};
pub use loader::{DrainState, Loader, ScriptSink};
pub use page::{HeadlessPage, ImageEvents, ImageHandle, Page};
pub use provider::{ResourceProvider, WasmProvider};
pub use resolve::{
    AssetValue, BUNDLE_KEY, BundleAssets, Completion, FALLBACK_KEY, HandlerKind, HandlerRegistry,
    ResolveError, ResolveOptions,
};

use rustc_hash::FxHashMap;
use serde_json::Value;
use thiserror::Error;

use crate::assemble::DataKind;
use crate::codec::CodecError;

/// The asset maps and settings of a drained artifact. Populated once by
/// the loader, read-only afterward.
#[derive(Debug, Default)]
pub struct RuntimeContext {
    /// General asset map: key -> literal text or base64.
    pub assets: FxHashMap<String, String>,
    /// Wasm map: name -> base64.
    pub wasm: FxHashMap<String, String>,
    /// Application settings, once the settings payload has drained.
    pub settings: Option<Value>,
}

impl RuntimeContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored payload of a general asset.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.assets.get(key).map(String::as_str)
    }

    /// Stored base64 payload of a wasm binary.
    pub fn wasm_payload(&self, name: &str) -> Option<&str> {
        self.wasm.get(name).map(String::as_str)
    }
}

/// Fatal runtime failures: anything that halts the drain or corrupts
/// the artifact contract.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("payload {position}: {source}")]
    Decode {
        position: usize,
        #[source]
        source: CodecError,
    },

    #[error("payload {position} carries unknown data-kind {kind:?}")]
    UnknownKind { position: usize, kind: String },

    #[error("payload {position} ({kind}) is not valid JSON: {source}")]
    Json {
        position: usize,
        kind: DataKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("script execution failed at payload {position}: {source}")]
    Script {
        position: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("payload blocks mix strategies {0} and {1}")]
    MixedStrategies(crate::codec::Strategy, crate::codec::Strategy),

    #[error("artifact markup failed to parse: {0}")]
    Parse(#[from] tl::ParseError),
}
