//! Sequential payload drain.
//!
//! The central ordering guarantee of the whole design lives here: no two
//! payload blocks are ever decoded or executed concurrently, because
//! module registration of chunk N+1 may reference symbols established by
//! chunk N. The drain pulls one block, decodes it, delivers it, and only
//! then touches the next — a single-consumer queue with backpressure of
//! one. Any failure aborts the drain; later blocks never execute.

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::assemble::DataKind;
use crate::codec::Codec;

use super::{PayloadBlock, RuntimeContext, RuntimeError};

/// Where recovered script chunks are executed. The browser bootstrap
/// appends script elements; tests record; `extract` writes files.
pub trait ScriptSink {
    fn exec(&mut self, source: &str, srctype: Option<&str>) -> anyhow::Result<()>;
}

/// Drain progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrainState {
    #[default]
    Idle,
    Draining,
    Done,
}

/// The sequential loader. Owns its sink so execution order is fully
/// observable through it afterward.
pub struct Loader<S> {
    codec: Codec,
    sink: S,
    state: DrainState,
}

impl<S: ScriptSink> Loader<S> {
    pub fn new(codec: Codec, sink: S) -> Self {
        Self {
            codec,
            sink,
            state: DrainState::Idle,
        }
    }

    pub fn state(&self) -> DrainState {
        self.state
    }

    /// Recover the sink (and whatever it observed).
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Drain every block, strictly in order. On error the state stays
    /// `Draining` and no later block is decoded or executed.
    pub fn drain(&mut self, blocks: &[PayloadBlock]) -> Result<RuntimeContext, RuntimeError> {
        self.state = DrainState::Draining;
        let mut ctx = RuntimeContext::new();

        for block in blocks {
            self.drain_one(block, &mut ctx)?;
        }

        self.state = DrainState::Done;
        Ok(ctx)
    }

    fn drain_one(
        &mut self,
        block: &PayloadBlock,
        ctx: &mut RuntimeContext,
    ) -> Result<(), RuntimeError> {
        let position = block.position;

        match block.kind {
            DataKind::Assets => {
                ctx.assets = self.decode_json::<FxHashMap<String, String>>(block)?;
            }
            DataKind::Wasm => {
                ctx.wasm = self.decode_json::<FxHashMap<String, String>>(block)?;
            }
            DataKind::Settings => {
                ctx.settings = Some(self.decode_json::<Value>(block)?);
            }
            DataKind::Chunk | DataKind::ImportMap => {
                let source = self
                    .codec
                    .decode_utf8(&block.encoded)
                    .map_err(|source| RuntimeError::Decode { position, source })?;
                self.sink
                    .exec(&source, block.srctype.as_deref())
                    .map_err(|source| RuntimeError::Script { position, source })?;
            }
        }
        Ok(())
    }

    fn decode_json<T: serde::de::DeserializeOwned>(
        &self,
        block: &PayloadBlock,
    ) -> Result<T, RuntimeError> {
        let position = block.position;
        let bytes = self
            .codec
            .decode(&block.encoded)
            .map_err(|source| RuntimeError::Decode { position, source })?;
        serde_json::from_slice(&bytes).map_err(|source| RuntimeError::Json {
            position,
            kind: block.kind,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{DEFAULT_LEVEL, Strategy};
    use anyhow::bail;
    use rustc_hash::FxHashSet;

    /// Emulates a module registry: a chunk `define:NAME` defines a
    /// symbol, `need:NAME define:OTHER` fails unless NAME was defined
    /// first. Mirrors SystemJS registration order sensitivity.
    #[derive(Default)]
    struct RegistrySink {
        defined: FxHashSet<String>,
        executed: Vec<String>,
    }

    impl ScriptSink for RegistrySink {
        fn exec(&mut self, source: &str, _srctype: Option<&str>) -> anyhow::Result<()> {
            for word in source.split_whitespace() {
                if let Some(name) = word.strip_prefix("need:") {
                    if !self.defined.contains(name) {
                        bail!("undefined reference: {name}");
                    }
                } else if let Some(name) = word.strip_prefix("define:") {
                    self.defined.insert(name.to_string());
                }
            }
            self.executed.push(source.to_string());
            Ok(())
        }
    }

    fn codec() -> Codec {
        Codec::new(Strategy::BitPack, "k", DEFAULT_LEVEL)
    }

    fn chunk(position: usize, source: &str) -> PayloadBlock {
        PayloadBlock {
            position,
            kind: DataKind::Chunk,
            srctype: None,
            encoded: codec().encode_str(source),
            strategy: Strategy::BitPack,
        }
    }

    fn json_block(position: usize, kind: DataKind, body: &str) -> PayloadBlock {
        PayloadBlock {
            position,
            kind,
            srctype: None,
            encoded: codec().encode_str(body),
            strategy: Strategy::BitPack,
        }
    }

    #[test]
    fn test_drain_populates_context_then_executes() {
        let blocks = vec![
            json_block(0, DataKind::Assets, r#"{"a.txt":"hi"}"#),
            json_block(1, DataKind::Wasm, r#"{"engine.wasm":"AAAA"}"#),
            chunk(2, "define:cc"),
            json_block(3, DataKind::Settings, r#"{"debug":false}"#),
        ];
        let mut loader = Loader::new(codec(), RegistrySink::default());
        assert_eq!(loader.state(), DrainState::Idle);
        let ctx = loader.drain(&blocks).unwrap();
        assert_eq!(loader.state(), DrainState::Done);
        assert_eq!(ctx.text("a.txt"), Some("hi"));
        assert_eq!(ctx.wasm_payload("engine.wasm"), Some("AAAA"));
        assert_eq!(ctx.settings.unwrap()["debug"], false);
        assert_eq!(loader.into_sink().executed, vec!["define:cc"]);
    }

    #[test]
    fn test_dependency_order_is_preserved() {
        // Chunk 2 needs the symbol chunk 1 defines. In-order drains run;
        // the reversed order fails at the dependent chunk, proving the
        // drain is order-sensitive rather than merely order-stable.
        let first = chunk(0, "define:base");
        let second = chunk(1, "need:base define:app");

        let mut loader = Loader::new(codec(), RegistrySink::default());
        loader.drain(&[first.clone(), second.clone()]).unwrap();
        assert_eq!(
            loader.into_sink().executed,
            vec!["define:base", "need:base define:app"]
        );

        let mut reversed = Loader::new(codec(), RegistrySink::default());
        let err = reversed.drain(&[second, first]).unwrap_err();
        assert!(matches!(err, RuntimeError::Script { position: 1, .. }));
    }

    #[test]
    fn test_decode_error_aborts_remaining_blocks() {
        let mut corrupt = chunk(1, "define:b");
        corrupt.encoded.push('Z');
        let blocks = vec![chunk(0, "define:a"), corrupt, chunk(2, "define:c")];

        let mut loader = Loader::new(codec(), RegistrySink::default());
        let err = loader.drain(&blocks).unwrap_err();
        assert!(matches!(err, RuntimeError::Decode { position: 1, .. }));
        assert_eq!(loader.state(), DrainState::Draining);
        // The block before the corrupt one ran; the one after never did.
        assert_eq!(loader.into_sink().executed, vec!["define:a"]);
    }

    #[test]
    fn test_srctype_reaches_the_sink() {
        struct TypeSink(Vec<Option<String>>);
        impl ScriptSink for TypeSink {
            fn exec(&mut self, _source: &str, srctype: Option<&str>) -> anyhow::Result<()> {
                self.0.push(srctype.map(str::to_string));
                Ok(())
            }
        }

        let mut block = chunk(0, "{}");
        block.kind = DataKind::ImportMap;
        block.srctype = Some("systemjs-importmap".to_string());

        let mut loader = Loader::new(codec(), TypeSink(Vec::new()));
        loader.drain(&[block]).unwrap();
        assert_eq!(
            loader.into_sink().0,
            vec![Some("systemjs-importmap".to_string())]
        );
    }

    #[test]
    fn test_malformed_map_json_is_fatal() {
        let blocks = vec![json_block(0, DataKind::Assets, "not json")];
        let mut loader = Loader::new(codec(), RegistrySink::default());
        assert!(matches!(
            loader.drain(&blocks),
            Err(RuntimeError::Json { position: 0, .. })
        ));
    }
}
