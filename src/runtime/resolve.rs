//! Virtual asset resolution.
//!
//! A closed dispatch table keyed by normalized file extension, with a
//! reserved `bundle` variant and a `default` fallback. Every handler
//! answers from the [`RuntimeContext`] maps and synthesizes the result
//! type the host's loader expects for that category; nothing here ever
//! touches the network.
//!
//! Failure policy: a missing script or config key is fatal and returned
//! as `Err` without invoking the completion. Every other path delivers
//! its outcome through the completion, exactly once — decorative assets
//! (images, fonts, media) report failures there and never halt the
//! layer.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rustc_hash::FxHashMap;
use serde_json::Value;
use thiserror::Error;

use crate::asset::extension_of;
use crate::{debug, log};

use super::RuntimeContext;
use super::bundle::BundleJoin;
use super::font;
use super::page::{ImageEvents, ImageHandle, Page};

/// Reserved registry key for composite sub-bundle resources.
pub const BUNDLE_KEY: &str = "bundle";

/// Reserved registry key for the fallback handler.
pub const FALLBACK_KEY: &str = "default";

// ============================================================================
// outcomes
// ============================================================================

/// What a handler resolves to.
#[derive(Debug)]
pub enum AssetValue {
    Json(Value),
    Text(String),
    Bytes(Vec<u8>),
    Image(ImageHandle),
    /// Derived font-family name, quoted when it contains whitespace.
    FontFamily(String),
    /// Object URL attached to a media element.
    BlobUrl(String),
    /// A script chunk was appended and ran.
    Executed,
    Bundle(BundleAssets),
}

/// A resolved sub-bundle.
#[derive(Debug)]
pub struct BundleAssets {
    pub config: Value,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("asset key not found: {0}")]
    MissingKey(String),

    #[error("asset {key} is not valid base64: {source}")]
    Base64 {
        key: String,
        #[source]
        source: base64::DecodeError,
    },

    #[error("asset {key} is not valid JSON: {source}")]
    Json {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("image decode failed: {0}")]
    Image(String),

    #[error("script {key} failed to execute: {source}")]
    Script {
        key: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Delivered exactly once per resolution that reaches it.
pub type Completion<'a> = Box<dyn FnOnce(Result<AssetValue, ResolveError>) + 'a>;

/// Per-request options.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Script type for executed chunks.
    pub srctype: Option<String>,
    /// Overrides the extension-derived MIME type.
    pub mime: Option<String>,
    /// Sub-bundle version tag baked into its config/entry paths.
    pub version: Option<String>,
}

// ============================================================================
// registry
// ============================================================================

/// Handler variants; the table maps extensions onto these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    Json,
    Text,
    Binary,
    Image,
    Font,
    Audio,
    Video,
    Script,
    Bundle,
}

/// Extension-keyed handler table.
pub struct HandlerRegistry {
    handlers: FxHashMap<String, HandlerKind>,
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HandlerRegistry {
    pub fn new() -> Self {
        let mut handlers = FxHashMap::default();
        let table: &[(&[&str], HandlerKind)] = &[
            (&[".json", ".exportjson"], HandlerKind::Json),
            // Mirrors the text allow-list the scanner embeds as literal UTF-8.
            (
                &[
                    ".txt", ".xml", ".vsh", ".fsh", ".atlas", ".fnt", ".plist", ".tmx", ".tsx",
                    ".rt", ".mtl", ".pmtl", ".prefab", ".log",
                ],
                HandlerKind::Text,
            ),
            (
                &[".binary", ".bin", ".dbbin", ".skel", ".cconb"],
                HandlerKind::Binary,
            ),
            (
                &[".png", ".jpg", ".jpeg", ".webp", ".gif", ".bmp"],
                HandlerKind::Image,
            ),
            (
                &[".ttf", ".otf", ".woff", ".woff2", ".eot"],
                HandlerKind::Font,
            ),
            (&[".mp3", ".ogg", ".wav", ".m4a"], HandlerKind::Audio),
            (&[".mp4", ".webm"], HandlerKind::Video),
            (&[".js"], HandlerKind::Script),
        ];
        for (exts, kind) in table {
            for ext in *exts {
                handlers.insert((*ext).to_string(), *kind);
            }
        }
        handlers.insert(BUNDLE_KEY.to_string(), HandlerKind::Bundle);
        // Unlisted extensions fall back to text delivery, like the host
        // loader this layer stands in for.
        handlers.insert(FALLBACK_KEY.to_string(), HandlerKind::Text);
        Self { handlers }
    }

    /// Register or override a handler for an extension (or reserved key).
    pub fn register(&mut self, key: &str, kind: HandlerKind) {
        self.handlers.insert(key.to_lowercase(), kind);
    }

    /// The handler an asset key dispatches to.
    pub fn handler_for(&self, key: &str) -> HandlerKind {
        extension_of(Path::new(key))
            .and_then(|ext| self.handlers.get(&ext).copied())
            .unwrap_or_else(|| {
                self.handlers
                    .get(FALLBACK_KEY)
                    .copied()
                    .unwrap_or(HandlerKind::Text)
            })
    }

    /// Resolve one asset through its handler.
    pub fn resolve<'a>(
        &self,
        ctx: &RuntimeContext,
        page: &mut dyn Page,
        key: &str,
        options: &ResolveOptions,
        completion: Completion<'a>,
    ) -> Result<(), ResolveError> {
        match self.handler_for(key) {
            HandlerKind::Json => resolve_json(ctx, key, completion),
            HandlerKind::Text => {
                resolve_decorative(ctx, key, completion, |text, _| {
                    Ok(AssetValue::Text(text.to_string()))
                });
                Ok(())
            }
            HandlerKind::Binary | HandlerKind::Audio => {
                resolve_decorative(ctx, key, completion, |text, k| {
                    decode_bytes(k, text).map(AssetValue::Bytes)
                });
                Ok(())
            }
            HandlerKind::Image => {
                resolve_image(ctx, page, key, options, completion);
                Ok(())
            }
            HandlerKind::Font => {
                resolve_font(ctx, page, key, options, completion);
                Ok(())
            }
            HandlerKind::Video => {
                let mime = request_mime(key, options);
                resolve_decorative(ctx, key, completion, |text, k| {
                    let bytes = decode_bytes(k, text)?;
                    Ok(AssetValue::BlobUrl(page.create_blob_url(&bytes, &mime)))
                });
                Ok(())
            }
            HandlerKind::Script => resolve_script(ctx, page, key, options, completion),
            HandlerKind::Bundle => {
                self.resolve_bundle(ctx, page, key, options, completion);
                Ok(())
            }
        }
    }

    /// Resolve a sub-bundle: config and entry script fetched together,
    /// completion fired once when the second leg arrives. Errors from
    /// either leg travel through the joined completion.
    pub fn resolve_bundle<'a>(
        &self,
        ctx: &RuntimeContext,
        page: &mut dyn Page,
        name: &str,
        options: &ResolveOptions,
        completion: Completion<'a>,
    ) {
        let (config_key, script_key) = match &options.version {
            Some(version) => (
                format!("{name}/config.{version}.json"),
                format!("{name}/index.{version}.js"),
            ),
            None => (format!("{name}/config.json"), format!("{name}/index.js")),
        };

        let join = BundleJoin::new(completion);
        let config_leg = join.config_leg();
        let script_leg = join.script_leg();

        let config_result = ctx
            .text(&config_key)
            .ok_or_else(|| ResolveError::MissingKey(config_key.clone()))
            .and_then(|text| {
                serde_json::from_str(text).map_err(|source| ResolveError::Json {
                    key: config_key.clone(),
                    source,
                })
            });
        config_leg(config_result);

        let script_result = match ctx.text(&script_key) {
            None => Err(ResolveError::MissingKey(script_key)),
            Some(source) => {
                page.exec_script(source, None)
                    .map_err(|source| ResolveError::Script {
                        key: script_key.clone(),
                        source,
                    })
            }
        };
        script_leg(script_result);
    }
}

// ============================================================================
// handlers
// ============================================================================

fn resolve_json(ctx: &RuntimeContext, key: &str, completion: Completion<'_>) -> Result<(), ResolveError> {
    let text = ctx
        .text(key)
        .ok_or_else(|| ResolveError::MissingKey(key.to_string()))?;
    let value: Value = serde_json::from_str(text).map_err(|source| ResolveError::Json {
        key: key.to_string(),
        source,
    })?;
    completion(Ok(AssetValue::Json(value)));
    Ok(())
}

fn resolve_script(
    ctx: &RuntimeContext,
    page: &mut dyn Page,
    key: &str,
    options: &ResolveOptions,
    completion: Completion<'_>,
) -> Result<(), ResolveError> {
    let source = ctx
        .text(key)
        .ok_or_else(|| ResolveError::MissingKey(key.to_string()))?;
    page.exec_script(source, options.srctype.as_deref())
        .map_err(|source| ResolveError::Script {
            key: key.to_string(),
            source,
        })?;
    completion(Ok(AssetValue::Executed));
    Ok(())
}

/// Shared shape of the non-fatal handlers: missing key or bad payload
/// goes through the completion's failure channel, never `Err`.
fn resolve_decorative<'a>(
    ctx: &RuntimeContext,
    key: &str,
    completion: Completion<'a>,
    produce: impl FnOnce(&str, &str) -> Result<AssetValue, ResolveError>,
) {
    let outcome = match ctx.text(key) {
        None => {
            debug!("resolve"; "missing asset key {key}");
            Err(ResolveError::MissingKey(key.to_string()))
        }
        Some(text) => produce(text, key),
    };
    completion(outcome);
}

fn resolve_image<'a>(
    ctx: &RuntimeContext,
    page: &mut dyn Page,
    key: &str,
    options: &ResolveOptions,
    completion: Completion<'a>,
) {
    let Some(payload) = ctx.text(key) else {
        debug!("resolve"; "missing asset key {key}");
        completion(Err(ResolveError::MissingKey(key.to_string())));
        return;
    };
    let src = data_uri(payload, &request_mime(key, options));

    // Split the single completion across the two native events; the
    // shared slot guarantees at most one delivery.
    let slot = Rc::new(RefCell::new(Some(completion)));
    let load_slot = Rc::clone(&slot);
    page.load_image(
        &src,
        ImageEvents {
            on_load: Box::new(move |handle| {
                if let Some(completion) = load_slot.borrow_mut().take() {
                    completion(Ok(AssetValue::Image(handle)));
                }
            }),
            on_error: Box::new(move |message| {
                if let Some(completion) = slot.borrow_mut().take() {
                    completion(Err(ResolveError::Image(message)));
                }
            }),
        },
    );
}

fn resolve_font<'a>(
    ctx: &RuntimeContext,
    page: &mut dyn Page,
    key: &str,
    options: &ResolveOptions,
    completion: Completion<'a>,
) {
    let Some(payload) = ctx.text(key) else {
        debug!("resolve"; "missing asset key {key}");
        completion(Err(ResolveError::MissingKey(key.to_string())));
        return;
    };

    let family = font::family_name(key);
    let ext = extension_of(Path::new(key)).unwrap_or_default();
    let source = font::font_face_source(payload, &request_mime(key, options), font::font_format(&ext));

    // The family name resolves whether or not the face loads; a failed
    // registration is reported and the text falls back unstyled.
    if let Err(err) = page.register_font(&family, &source) {
        log!("resolve"; "font face {family} failed to load: {err}");
    }
    completion(Ok(AssetValue::FontFamily(family)));
}

// ============================================================================
// helpers
// ============================================================================

fn decode_bytes(key: &str, payload: &str) -> Result<Vec<u8>, ResolveError> {
    STANDARD
        .decode(payload)
        .map_err(|source| ResolveError::Base64 {
            key: key.to_string(),
            source,
        })
}

fn data_uri(payload: &str, mime: &str) -> String {
    if payload.starts_with("data:") {
        payload.to_string()
    } else {
        format!("data:{mime};base64,{payload}")
    }
}

fn request_mime(key: &str, options: &ResolveOptions) -> String {
    options.mime.clone().unwrap_or_else(|| {
        extension_of(Path::new(key))
            .map(|ext| mime_for(&ext))
            .unwrap_or("application/octet-stream")
            .to_string()
    })
}

fn mime_for(ext: &str) -> &'static str {
    match ext {
        ".png" => "image/png",
        ".jpg" | ".jpeg" => "image/jpeg",
        ".webp" => "image/webp",
        ".gif" => "image/gif",
        ".bmp" => "image/bmp",
        ".ttf" => "font/ttf",
        ".otf" => "font/otf",
        ".woff" => "font/woff",
        ".woff2" => "font/woff2",
        ".mp3" => "audio/mpeg",
        ".ogg" => "audio/ogg",
        ".wav" => "audio/wav",
        ".m4a" => "audio/mp4",
        ".mp4" => "video/mp4",
        ".webm" => "video/webm",
        _ => "application/octet-stream",
    }
}
