//! Bytes-by-name capability for binary modules.
//!
//! The original runtime redirected the engine's wasm fetches by patching
//! the global fetch primitives; here the subsystem that needs bytes gets
//! handed a provider instead.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::resolve::ResolveError;
use super::RuntimeContext;

/// Serves binary module bytes by name, with no network behind it.
pub trait ResourceProvider {
    fn bytes(&self, name: &str) -> Result<Vec<u8>, ResolveError>;
}

/// Provider backed by the context's wasm map. A missing name is fatal:
/// a wasm module is code, and code the engine asked for must exist.
pub struct WasmProvider<'a> {
    ctx: &'a RuntimeContext,
}

impl<'a> WasmProvider<'a> {
    pub fn new(ctx: &'a RuntimeContext) -> Self {
        Self { ctx }
    }
}

impl ResourceProvider for WasmProvider<'_> {
    fn bytes(&self, name: &str) -> Result<Vec<u8>, ResolveError> {
        let payload = self
            .ctx
            .wasm_payload(name)
            .ok_or_else(|| ResolveError::MissingKey(name.to_string()))?;
        STANDARD
            .decode(payload)
            .map_err(|source| ResolveError::Base64 {
                key: name.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wasm_bytes_roundtrip() {
        let mut ctx = RuntimeContext::new();
        let module = [0u8, 97, 115, 109, 1, 0, 0, 0];
        ctx.wasm
            .insert("engine.wasm".to_string(), STANDARD.encode(module));

        let provider = WasmProvider::new(&ctx);
        assert_eq!(provider.bytes("engine.wasm").unwrap(), module);
    }

    #[test]
    fn test_missing_module_is_fatal() {
        let ctx = RuntimeContext::new();
        let provider = WasmProvider::new(&ctx);
        assert!(matches!(
            provider.bytes("gone.wasm"),
            Err(ResolveError::MissingKey(_))
        ));
    }
}
