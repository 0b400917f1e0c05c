//! Chunk preparation: logical module identifiers and the application
//! bootstrap rewrite.
//!
//! A SystemJS chunk registers anonymously (`System.register([...])`). To
//! import it from an in-memory registry it needs a logical name, injected
//! into the registration call itself: `System.register("chunks:///<name>",
//! [...])`. Imports then resolve by name with no URL ever fetched.

/// Prefix of every logical chunk id.
pub const CHUNK_SCHEME: &str = "chunks:///";

const REGISTER_ANON: &str = "System.register([";

/// Inject a logical module id into an anonymous `System.register` call.
///
/// Only the first registration is named; a chunk registers once. A chunk
/// without a registration call passes through untouched.
pub fn inject_chunk_id(source: &str, name: &str) -> String {
    source.replacen(
        REGISTER_ANON,
        &format!("System.register(\"{CHUNK_SCHEME}{name}\",["),
        1,
    )
}

/// The logical id of a chunk.
pub fn chunk_id(name: &str) -> String {
    format!("{CHUNK_SCHEME}{name}")
}

/// The final payload: import the entry chunk by logical name.
pub fn entry_import(entry: &str) -> String {
    format!("System.import(\"{}\");\n", chunk_id(entry))
}

/// Rewrite the application bootstrap chunk.
///
/// Beyond the logical id, the application chunk needs three edits to run
/// from memory:
/// - drop its references to loose settings files (they are embedded),
/// - hand the embedded settings object to the engine right after the
///   engine binding is established.
pub fn prepare_application(source: &str, name: &str) -> String {
    let source = inject_chunk_id(source, name);
    let source = source.replace("src/settings.json", "");
    let source = source.replace("src/effect.bin", "");
    source.replace(
        "cc = engine;",
        "cc = engine;\n    cc.settings._settings = window.onepack.settings;",
    )
}
