//! Payload enumeration: find every embedded payload block of an
//! artifact, in document order.

use crate::assemble::DataKind;
use crate::codec::{PAYLOAD_TYPE_PREFIX, Strategy};

use super::RuntimeError;

/// One embedded payload block, as found in the artifact.
#[derive(Debug, Clone)]
pub struct PayloadBlock {
    /// Ordinal within the document; drain order.
    pub position: usize,
    pub kind: DataKind,
    /// Script type the chunk re-executes with, if any.
    pub srctype: Option<String>,
    /// Encoded text content, untouched.
    pub encoded: String,
    pub strategy: Strategy,
}

/// Enumerate payload blocks in document order.
///
/// Blocks carrying a different strategy than the first one are a
/// malformed artifact: encode and decode must never mix strategies.
pub fn enumerate_payloads(html: &str) -> Result<Vec<PayloadBlock>, RuntimeError> {
    let dom = tl::parse(html, tl::ParserOptions::default())?;
    let parser = dom.parser();

    let mut blocks = Vec::new();
    // dom.nodes() yields every node in parse order, which for well-formed
    // markup is document order.
    for node in dom.nodes() {
        let tl::Node::Tag(tag) = node else { continue };
        if tag.name().as_utf8_str() != "script" {
            continue;
        }
        let Some(type_attr) = attribute(tag, "type") else {
            continue;
        };
        if !type_attr.starts_with(PAYLOAD_TYPE_PREFIX) {
            continue;
        }
        if attribute(tag, "data-decrypt").as_deref() != Some("true") {
            continue;
        }

        let position = blocks.len();
        let strategy = Strategy::from_payload_type(&type_attr)
            .map_err(|source| RuntimeError::Decode { position, source })?;

        let kind_attr = attribute(tag, "data-kind").unwrap_or_default();
        let kind = DataKind::parse(&kind_attr).ok_or_else(|| RuntimeError::UnknownKind {
            position,
            kind: kind_attr.clone(),
        })?;

        blocks.push(PayloadBlock {
            position,
            kind,
            srctype: attribute(tag, "srctype"),
            encoded: tag.inner_text(parser).into_owned(),
            strategy,
        });
    }

    if let Some(first) = blocks.first() {
        for block in &blocks[1..] {
            if block.strategy != first.strategy {
                return Err(RuntimeError::MixedStrategies(
                    first.strategy,
                    block.strategy,
                ));
            }
        }
    }

    Ok(blocks)
}

/// The single strategy of an enumerated artifact, or `None` when it has
/// no payload blocks.
pub fn artifact_strategy(blocks: &[PayloadBlock]) -> Option<Strategy> {
    blocks.first().map(|block| block.strategy)
}

fn attribute(tag: &tl::HTMLTag, name: &str) -> Option<String> {
    tag.attributes()
        .get(name)
        .flatten()
        .map(|v| v.as_utf8_str().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(strategy: &str, kind: &str, body: &str) -> String {
        format!(
            "<script type=\"application/onepack+{strategy}\" data-decrypt=\"true\" \
             data-kind=\"{kind}\">{body}</script>"
        )
    }

    #[test]
    fn test_blocks_enumerate_in_document_order() {
        let html = format!(
            "<html><body>{}{}{}</body></html>",
            payload("bitpack", "assets", "ꀀ"),
            payload("bitpack", "chunk", "ꀁ"),
            payload("bitpack", "settings", "ꀂ"),
        );
        let blocks = enumerate_payloads(&html).unwrap();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].kind, DataKind::Assets);
        assert_eq!(blocks[1].kind, DataKind::Chunk);
        assert_eq!(blocks[2].kind, DataKind::Settings);
        assert_eq!(blocks[2].position, 2);
        assert_eq!(artifact_strategy(&blocks), Some(Strategy::BitPack));
    }

    #[test]
    fn test_plain_scripts_are_not_payloads() {
        let html = concat!(
            "<body><script>var x = 1;</script>",
            "<script type=\"module\">import 'x';</script></body>"
        );
        assert!(enumerate_payloads(html).unwrap().is_empty());
    }

    #[test]
    fn test_mixed_strategies_rejected() {
        let html = format!(
            "<body>{}{}</body>",
            payload("bitpack", "chunk", "ꀀ"),
            payload("wide", "chunk", "ĀĀ"),
        );
        assert!(matches!(
            enumerate_payloads(&html),
            Err(RuntimeError::MixedStrategies(_, _))
        ));
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let html = format!("<body>{}</body>", payload("bitpack", "mystery", "ꀀ"));
        assert!(matches!(
            enumerate_payloads(&html),
            Err(RuntimeError::UnknownKind { position: 0, .. })
        ));
    }

    #[test]
    fn test_srctype_carried() {
        let html = concat!(
            "<body><script type=\"application/onepack+bitpack\" data-decrypt=\"true\" ",
            "data-kind=\"import-map\" srctype=\"systemjs-importmap\">ꀀ</script></body>"
        );
        let blocks = enumerate_payloads(html).unwrap();
        assert_eq!(blocks[0].srctype.as_deref(), Some("systemjs-importmap"));
    }
}
