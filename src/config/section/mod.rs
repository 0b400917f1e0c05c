//! Configuration section definitions.
//!
//! | Section         | Purpose                                  |
//! |-----------------|------------------------------------------|
//! | `[build]`       | Build tree paths and artifact location   |
//! | `[build.hooks]` | External pre/post commands               |
//! | `[codec]`       | Key, strategy, compression level         |
//! | `[assets]`      | Classification allow-lists               |

mod assets;
mod build;
mod codec;
mod hooks;

pub use assets::AssetsConfig;
pub use build::BuildConfig;
pub use codec::CodecConfig;
pub use hooks::{HookConfig, HooksConfig};
