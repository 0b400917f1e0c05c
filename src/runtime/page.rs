//! The `Page` capability: every browser-native side effect the
//! resolution layer needs, behind one trait so it can run headless.

use rustc_hash::FxHashSet;

use super::loader::ScriptSink;

/// A decoded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHandle {
    /// The source the image was constructed from (data URI).
    pub src: String,
}

/// Load/error continuations for an image. Implementations must invoke
/// exactly one of the two, never both.
pub struct ImageEvents<'a> {
    pub on_load: Box<dyn FnOnce(ImageHandle) + 'a>,
    pub on_error: Box<dyn FnOnce(String) + 'a>,
}

/// Browser-native operations, injected into the resolution layer.
pub trait Page {
    /// Construct an image from a data URI; fires `on_load` or `on_error`.
    fn load_image(&mut self, src: &str, events: ImageEvents<'_>);

    /// Register a font face under the derived family name.
    fn register_font(&mut self, family: &str, source: &str) -> anyhow::Result<()>;

    /// An object URL for in-memory bytes (media elements want a URL).
    fn create_blob_url(&mut self, bytes: &[u8], mime: &str) -> String;

    /// Append and run a script element.
    fn exec_script(&mut self, source: &str, srctype: Option<&str>) -> anyhow::Result<()>;
}

/// In-memory `Page` recording every side effect; failure modes are
/// switchable so error paths can be exercised.
#[derive(Default)]
pub struct HeadlessPage {
    pub executed: Vec<(String, Option<String>)>,
    pub fonts: Vec<(String, String)>,
    pub blob_urls: Vec<(String, String)>,
    /// Image sources that should fire the error event instead of load.
    pub failing_images: FxHashSet<String>,
    /// Families whose font-face registration should fail.
    pub failing_fonts: FxHashSet<String>,
    /// Image events fired so far; at most one per `load_image` call.
    pub image_events: usize,
}

impl HeadlessPage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Page for HeadlessPage {
    fn load_image(&mut self, src: &str, events: ImageEvents<'_>) {
        self.image_events += 1;
        if src.is_empty() || self.failing_images.contains(src) {
            (events.on_error)(format!("image decode failed: {src}"));
        } else {
            (events.on_load)(ImageHandle {
                src: src.to_string(),
            });
        }
    }

    fn register_font(&mut self, family: &str, source: &str) -> anyhow::Result<()> {
        if self.failing_fonts.contains(family) {
            anyhow::bail!("font face rejected: {family}");
        }
        self.fonts.push((family.to_string(), source.to_string()));
        Ok(())
    }

    fn create_blob_url(&mut self, bytes: &[u8], mime: &str) -> String {
        let url = format!("blob:onepack/{}-{}", self.blob_urls.len(), bytes.len());
        self.blob_urls.push((url.clone(), mime.to_string()));
        url
    }

    fn exec_script(&mut self, source: &str, srctype: Option<&str>) -> anyhow::Result<()> {
        self.executed
            .push((source.to_string(), srctype.map(str::to_string)));
        Ok(())
    }
}

impl ScriptSink for HeadlessPage {
    fn exec(&mut self, source: &str, srctype: Option<&str>) -> anyhow::Result<()> {
        self.exec_script(source, srctype)
    }
}
