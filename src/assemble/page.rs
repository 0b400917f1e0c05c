//! Source page rewriting.
//!
//! The source page is parsed with `tl` and re-serialized with every
//! network-touching element removed: script elements disappear (their
//! `src` targets are collected for embedding as chunks), same-origin
//! stylesheets are inlined as `<style>` blocks, and comments are
//! stripped. The doctype and everything else pass through; kept tags
//! are emitted from their source bytes, so attribute order and quoting
//! survive untouched.

use anyhow::{Context, Result};
use std::path::Path;

/// Elements with no closing tag.
const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// A `<script src>` reference collected from the page, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageScript {
    /// The `src` attribute as written in the page.
    pub src: String,
    /// The `type` attribute, if any.
    pub kind: Option<String>,
}

/// A rewritten page.
pub struct RewrittenPage {
    /// Markup with scripts and comments removed and stylesheets inlined.
    pub html: String,
    /// Script references removed from the page, in document order.
    pub scripts: Vec<PageScript>,
}

/// Rewrite the source page markup.
///
/// `page_dir` anchors relative stylesheet hrefs.
pub fn rewrite_page(source: &str, page_dir: &Path) -> Result<RewrittenPage> {
    let dom = tl::parse(source, tl::ParserOptions::default())
        .context("parsing source page markup")?;
    let parser = dom.parser();

    let mut rewriter = PageRewriter {
        page_dir,
        html: String::with_capacity(source.len()),
        scripts: Vec::new(),
    };
    // tl drops the doctype during parsing, so it is re-emitted from the
    // source prefix.
    let head = source.trim_start();
    if head.len() >= 9 && head[..9].eq_ignore_ascii_case("<!doctype") {
        if let Some(end) = head.find('>') {
            rewriter.html.push_str(&head[..=end]);
        }
    }
    for handle in dom.children() {
        rewriter.write_node(*handle, parser)?;
    }

    Ok(RewrittenPage {
        html: rewriter.html,
        scripts: rewriter.scripts,
    })
}

struct PageRewriter<'a> {
    page_dir: &'a Path,
    html: String,
    scripts: Vec<PageScript>,
}

impl PageRewriter<'_> {
    fn write_node(&mut self, handle: tl::NodeHandle, parser: &tl::Parser) -> Result<()> {
        let Some(node) = handle.get(parser) else {
            return Ok(());
        };

        match node {
            tl::Node::Tag(tag) => self.write_tag(tag, parser),
            tl::Node::Raw(bytes) => {
                self.html.push_str(&bytes.as_utf8_str());
                Ok(())
            }
            tl::Node::Comment(_) => Ok(()),
        }
    }

    fn write_tag(&mut self, tag: &tl::HTMLTag, parser: &tl::Parser) -> Result<()> {
        let name = tag.name().as_utf8_str().to_lowercase();

        match name.as_str() {
            "script" => {
                self.collect_script(tag);
                return Ok(());
            }
            "link" if self.try_inline_stylesheet(tag)? => return Ok(()),
            _ => {}
        }

        // The raw span covers the whole element; its prefix up to the
        // first unquoted '>' is the opening tag exactly as written.
        let raw = tag.raw().as_utf8_str();
        self.html.push_str(open_tag(&raw));

        if VOID_ELEMENTS.contains(&name.as_str()) {
            return Ok(());
        }

        for child in tag.children().top().iter() {
            self.write_node(*child, parser)?;
        }

        self.html.push_str("</");
        self.html.push_str(&tag.name().as_utf8_str());
        self.html.push('>');
        Ok(())
    }

    /// Record an external script reference. Inline scripts vanish; the
    /// import map arrives through its own payload, so importmap script
    /// elements are dropped without being recorded.
    fn collect_script(&mut self, tag: &tl::HTMLTag) {
        let Some(src) = attribute(tag, "src") else {
            return;
        };
        let kind = attribute(tag, "type");
        if kind.as_deref() == Some("systemjs-importmap") {
            return;
        }
        self.scripts.push(PageScript { src, kind });
    }

    /// Inline a same-origin stylesheet as a `<style>` block. Returns
    /// false when the element is not a local stylesheet link and should
    /// be serialized as-is.
    fn try_inline_stylesheet(&mut self, tag: &tl::HTMLTag) -> Result<bool> {
        let rel = attribute(tag, "rel");
        if rel.as_deref() != Some("stylesheet") {
            return Ok(false);
        }
        let Some(href) = attribute(tag, "href") else {
            return Ok(false);
        };
        if !is_same_origin(&href) {
            return Ok(false);
        }

        let path = self.page_dir.join(href.trim_start_matches("./"));
        let css = std::fs::read_to_string(&path)
            .with_context(|| format!("inlining stylesheet {}", path.display()))?;
        self.html.push_str("<style>\n");
        self.html.push_str(&css);
        self.html.push_str("\n</style>");
        Ok(true)
    }
}

/// The opening-tag prefix of a raw element span, quote-aware so a '>'
/// inside an attribute value does not cut it short.
fn open_tag(raw: &str) -> &str {
    let mut quote = None;
    for (i, b) in raw.bytes().enumerate() {
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'>' => return &raw[..=i],
                _ => {}
            },
        }
    }
    raw
}

fn attribute(tag: &tl::HTMLTag, name: &str) -> Option<String> {
    tag.attributes()
        .get(name)
        .flatten()
        .map(|v| v.as_utf8_str().into_owned())
}

/// A reference that resolves inside the build, rather than to another
/// host or scheme.
fn is_same_origin(href: &str) -> bool {
    !href.contains("://") && !href.starts_with("//") && !href.starts_with("data:")
}
