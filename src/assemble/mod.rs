//! Artifact assembly.
//!
//! Takes the rewritten source page, the asset maps, and every script
//! chunk of the build, encodes each piece as an inert payload element,
//! and splices payloads plus the bootstrap script into the page.
//!
//! Payload order is part of the artifact contract. The in-browser drain
//! is strictly sequential, so ordering doubles as dependency order:
//!
//! 1. asset map, wasm map (data before any code runs)
//! 2. module runtime chunks (the page's own scripts, document order)
//! 3. engine chunks, script packages, application chunk, entry chunk
//! 4. settings, import map
//! 5. the entry import, always last

mod chunk;
mod page;
mod settings;

pub use chunk::{CHUNK_SCHEME, chunk_id, entry_import, inject_chunk_id, prepare_application};
pub use page::{PageScript, RewrittenPage, rewrite_page};
pub use settings::{Settings, compress_settings, load_settings, parse_settings, rewrite_import_map};

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::fmt;
use std::path::Path;

use crate::asset::AssetMaps;
use crate::codec::Codec;
use crate::config::PackConfig;
use crate::embed::{BOOTSTRAP_JS, BootstrapVars};
use crate::hooks::BuildHooks;
use crate::logger::ProgressLine;
use crate::utils::html::escape;
use crate::{debug, log};

// ============================================================================
// Payloads
// ============================================================================

/// What a payload element carries; emitted as its `data-kind` attribute
/// and dispatched on by the drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    /// JSON asset map, absorbed into the runtime context.
    Assets,
    /// JSON wasm map, absorbed into the runtime context.
    Wasm,
    /// Script chunk, executed in place.
    Chunk,
    /// JSON settings, absorbed into the runtime context.
    Settings,
    /// SystemJS import map, executed in place with its own script type.
    ImportMap,
}

impl DataKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Assets => "assets",
            Self::Wasm => "wasm",
            Self::Chunk => "chunk",
            Self::Settings => "settings",
            Self::ImportMap => "import-map",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "assets" => Some(Self::Assets),
            "wasm" => Some(Self::Wasm),
            "chunk" => Some(Self::Chunk),
            "settings" => Some(Self::Settings),
            "import-map" => Some(Self::ImportMap),
            _ => None,
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One payload before encoding.
#[derive(Debug, Clone)]
pub struct Payload {
    pub kind: DataKind,
    /// The `srctype` attribute: the script type the chunk re-executes
    /// with. `None` for plain chunks and absorbed JSON.
    pub srctype: Option<String>,
    /// Plaintext body handed to the codec.
    pub body: String,
}

impl Payload {
    fn chunk(body: String) -> Self {
        Self {
            kind: DataKind::Chunk,
            srctype: None,
            body,
        }
    }

    fn json(kind: DataKind, body: String) -> Self {
        Self {
            kind,
            srctype: None,
            body,
        }
    }
}

/// Render one payload as an inert script element.
fn render_payload(codec: &Codec, payload: &Payload) -> String {
    let mut element = String::new();
    element.push_str("<script type=\"");
    element.push_str(&codec.strategy().payload_type());
    element.push_str("\" data-decrypt=\"true\" data-kind=\"");
    element.push_str(payload.kind.as_str());
    element.push('"');
    if let Some(srctype) = &payload.srctype {
        element.push_str(" srctype=\"");
        element.push_str(&escape(srctype));
        element.push('"');
    }
    element.push('>');
    // Both repertoires are entirely non-ASCII, so the encoded text can
    // never form a tag or entity; no escaping pass is needed.
    element.push_str(&codec.encode_str(&payload.body));
    element.push_str("</script>");
    element
}

// ============================================================================
// Assembly
// ============================================================================

/// Build the complete artifact markup.
pub fn assemble(
    config: &PackConfig,
    maps: &AssetMaps,
    hooks: &mut dyn BuildHooks,
) -> Result<String> {
    let build = &config.build;
    let page_path = build.page_path();
    let source = std::fs::read_to_string(&page_path)
        .with_context(|| format!("reading source page {}", page_path.display()))?;
    let page_dir = page_path.parent().unwrap_or(build.src.as_path());
    let rewritten = rewrite_page(&source, page_dir)?;

    let payloads = collect_payloads(config, maps, &rewritten, hooks)?;
    log!("pack"; "encoding {} payloads", payloads.len());

    let codec = config.codec.codec();
    let progress = ProgressLine::new(&[("payloads", payloads.len())]);
    let elements: Vec<String> = payloads
        .par_iter()
        .map(|payload| {
            let element = render_payload(&codec, payload);
            progress.inc("payloads");
            element
        })
        .collect();
    progress.finish();

    let mut injected = String::with_capacity(elements.iter().map(String::len).sum());
    for element in &elements {
        injected.push_str(element);
        injected.push('\n');
    }
    injected.push_str("<script charset=\"utf-8\">\n");
    injected.push_str(&BOOTSTRAP_JS.render(&BootstrapVars::new(
        &config.codec.key,
        codec.strategy(),
    )));
    injected.push_str("\n</script>\n");

    Ok(splice_before_body_end(&rewritten.html, &injected))
}

/// Every payload of the artifact, in drain order.
fn collect_payloads(
    config: &PackConfig,
    maps: &AssetMaps,
    rewritten: &RewrittenPage,
    hooks: &mut dyn BuildHooks,
) -> Result<Vec<Payload>> {
    let build = &config.build;
    let mut payloads = Vec::new();

    payloads.push(Payload::json(DataKind::Assets, maps.assets_json()));
    if !maps.wasm.is_empty() {
        payloads.push(Payload::json(DataKind::Wasm, maps.wasm_json()));
    }

    // The page's own scripts become the module runtime: loader, polyfills,
    // whatever the page pulled in, re-executed in document order. The
    // application and entry chunks get dedicated rewrites below.
    for script in &rewritten.scripts {
        if script.src == build.application || script.src == build.entry {
            continue;
        }
        let path = build.src.join(&script.src);
        let source = std::fs::read_to_string(&path)
            .with_context(|| format!("reading page script {}", path.display()))?;
        payloads.push(Payload {
            kind: DataKind::Chunk,
            srctype: script.kind.clone(),
            body: inject_chunk_id(&source, &script.src),
        });
    }

    for (name, source) in engine_chunks(&build.src.join(&build.engine), config)? {
        payloads.push(Payload::chunk(inject_chunk_id(&source, &name)));
    }

    let mut settings_json = parse_settings(&build.settings_path())?;
    hooks.on_before_compress_settings(&settings_json);
    let script_packages = compress_settings(&mut settings_json);
    hooks.on_after_compress_settings(&settings_json);
    let settings = Settings {
        json: settings_json,
        script_packages,
    };

    for package in &settings.script_packages {
        let name = package.trim_start_matches("../");
        let path = build.src.join(name);
        let source = std::fs::read_to_string(&path)
            .with_context(|| format!("reading script package {}", path.display()))?;
        payloads.push(Payload::chunk(inject_chunk_id(&source, name)));
    }

    let application_path = build.src.join(&build.application);
    let application = std::fs::read_to_string(&application_path)
        .with_context(|| format!("reading application chunk {}", application_path.display()))?;
    payloads.push(Payload::chunk(prepare_application(
        &application,
        &build.application,
    )));

    let entry_path = build.src.join(&build.entry);
    let entry = std::fs::read_to_string(&entry_path)
        .with_context(|| format!("reading entry chunk {}", entry_path.display()))?;
    payloads.push(Payload::chunk(inject_chunk_id(&entry, &build.entry)));

    payloads.push(Payload::json(
        DataKind::Settings,
        settings.json.to_string(),
    ));

    let engine_dir = build.engine.to_string_lossy();
    payloads.push(Payload {
        kind: DataKind::ImportMap,
        srctype: Some("systemjs-importmap".to_string()),
        body: rewrite_import_map(&build.import_map_path(), &engine_dir)?,
    });

    payloads.push(Payload::chunk(entry_import(&build.entry)));
    Ok(payloads)
}

/// Script chunks of the engine directory, sorted by flat file name.
/// A missing directory means a build without an engine bundle.
fn engine_chunks(engine_dir: &Path, config: &PackConfig) -> Result<Vec<(String, String)>> {
    if !engine_dir.is_dir() {
        debug!("pack"; "no engine directory at {}", engine_dir.display());
        return Ok(Vec::new());
    }

    let mut names: Vec<String> = std::fs::read_dir(engine_dir)
        .with_context(|| format!("listing engine directory {}", engine_dir.display()))?
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let name = entry.file_name().into_string().ok()?;
            let ext = crate::asset::extension_of(Path::new(&name))?;
            (entry.file_type().ok()?.is_file() && config.assets.is_script_extension(&ext))
                .then_some(name)
        })
        .collect();
    names.sort();

    names
        .into_iter()
        .map(|name| {
            let path = engine_dir.join(&name);
            let source = std::fs::read_to_string(&path)
                .with_context(|| format!("reading engine chunk {}", path.display()))?;
            Ok((name, source))
        })
        .collect()
}

/// Insert markup before the closing body tag, or append when the page
/// has none.
fn splice_before_body_end(html: &str, injected: &str) -> String {
    let lower = html.to_ascii_lowercase();
    match lower.rfind("</body>") {
        Some(at) => {
            let mut out = String::with_capacity(html.len() + injected.len());
            out.push_str(&html[..at]);
            out.push_str(injected);
            out.push_str(&html[at..]);
            out
        }
        None => {
            let mut out = html.to_string();
            out.push_str(injected);
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::scan_assets;
    use crate::config::test_parse_config;
    use serde_json::json;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// A minimal but complete build tree.
    fn fake_build(dir: &TempDir) -> PathBuf {
        let src = dir.path().join("build");
        fs::create_dir_all(src.join("src")).unwrap();
        fs::create_dir_all(src.join("assets")).unwrap();
        fs::create_dir_all(src.join("cocos-js")).unwrap();

        fs::write(
            src.join("index.html"),
            concat!(
                "<!DOCTYPE html><html><head>",
                r#"<script src="src/polyfills.bundle.js"></script>"#,
                r#"<script type="systemjs-importmap" src="src/import-map.json"></script>"#,
                r#"<script src="src/system.bundle.js"></script>"#,
                "</head><body>",
                "<script>System.import('./index.js');</script>",
                "</body></html>"
            ),
        )
        .unwrap();
        fs::write(src.join("src/polyfills.bundle.js"), "/* polyfills */").unwrap();
        fs::write(src.join("src/system.bundle.js"), "/* systemjs */").unwrap();
        fs::write(
            src.join("index.js"),
            "System.register([], function () {});",
        )
        .unwrap();
        fs::write(
            src.join("application.js"),
            "System.register([], function () { cc = engine; });",
        )
        .unwrap();
        fs::write(
            src.join("cocos-js/cc.js"),
            "System.register([], function () {});",
        )
        .unwrap();
        fs::write(src.join("cocos-js/engine.wasm"), [0u8, 97, 115, 109]).unwrap();
        fs::write(
            src.join("src/settings.json"),
            json!({
                "splashScreen": { "totalTime": 1000 },
                "scripting": { "scriptPackages": [] }
            })
            .to_string(),
        )
        .unwrap();
        fs::write(
            src.join("src/import-map.json"),
            json!({ "imports": { "cc": "./../cocos-js/cc.js" } }).to_string(),
        )
        .unwrap();
        fs::write(src.join("assets/config.json"), "{}").unwrap();
        src
    }

    fn test_config(src: &Path) -> crate::config::PackConfig {
        let mut config = test_parse_config("");
        config.build.src = src.to_path_buf();
        config.build.output = src.parent().unwrap().join("index.single.html");
        config
    }

    #[test]
    fn test_payload_order() {
        let dir = TempDir::new().unwrap();
        let src = fake_build(&dir);
        let config = test_config(&src);
        let maps = scan_assets(&src, &config.build.engine, &config.assets).unwrap();

        let page = fs::read_to_string(config.build.page_path()).unwrap();
        let rewritten = rewrite_page(&page, &src).unwrap();
        let mut hooks = crate::hooks::LoggingHooks;
        let payloads = collect_payloads(&config, &maps, &rewritten, &mut hooks).unwrap();

        let kinds: Vec<DataKind> = payloads.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DataKind::Assets,
                DataKind::Wasm,
                DataKind::Chunk, // polyfills
                DataKind::Chunk, // systemjs
                DataKind::Chunk, // engine cc.js
                DataKind::Chunk, // application
                DataKind::Chunk, // entry
                DataKind::Settings,
                DataKind::ImportMap,
                DataKind::Chunk, // entry import
            ]
        );
        assert_eq!(
            payloads.last().unwrap().body,
            "System.import(\"chunks:///index.js\");\n"
        );
        assert!(payloads[5].body.contains("window.onepack.settings"));
    }

    #[test]
    fn test_assembled_artifact_shape() {
        let dir = TempDir::new().unwrap();
        let src = fake_build(&dir);
        let config = test_config(&src);
        let maps = scan_assets(&src, &config.build.engine, &config.assets).unwrap();

        let mut hooks = crate::hooks::LoggingHooks;
        let html = assemble(&config, &maps, &mut hooks).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        // Payloads and bootstrap land inside the body.
        let body_end = html.rfind("</body>").unwrap();
        let first_payload = html.find("application/onepack+").unwrap();
        assert!(first_payload < body_end);
        assert!(html.contains("data-kind=\"assets\""));
        assert!(html.contains("srctype=\"systemjs-importmap\""));
        // The bootstrap executable comes after every payload element.
        let bootstrap = html.rfind("<script charset=\"utf-8\">").unwrap();
        let last_payload = html.rfind("data-decrypt=\"true\"").unwrap();
        assert!(bootstrap > last_payload);
        // No plain page script survives.
        assert!(!html.contains("src/polyfills.bundle.js\"></script>"));
    }

    #[test]
    fn test_data_kind_parse() {
        for kind in [
            DataKind::Assets,
            DataKind::Wasm,
            DataKind::Chunk,
            DataKind::Settings,
            DataKind::ImportMap,
        ] {
            assert_eq!(DataKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(DataKind::parse("other"), None);
    }

    #[test]
    fn test_payload_roundtrips_through_codec() {
        let codec = crate::codec::Codec::new(
            crate::codec::Strategy::BitPack,
            "k",
            crate::codec::DEFAULT_LEVEL,
        );
        let payload = Payload::chunk("System.import(\"chunks:///index.js\");\n".into());
        let element = render_payload(&codec, &payload);
        let start = element.find('>').unwrap() + 1;
        let end = element.rfind("</script>").unwrap();
        assert_eq!(codec.decode_utf8(&element[start..end]).unwrap(), payload.body);
    }
}
