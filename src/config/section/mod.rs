//! Configuration section definitions.
//!
//! Each module corresponds to a section in `livefront.toml`:
//!
//! | Module    | TOML Section  | Purpose                                  |
//! |-----------|---------------|------------------------------------------|
//! | `compile` | `[compile]`   | Scan, output, cascade and watcher        |
//! | `serve`   | `[serve]`     | HTTP server and live reload              |
//! | `dialect` | `[[dialect]]` | External-command dialects                |

mod compile;
mod dialect;
mod serve;

pub use compile::CompileConfig;
pub use dialect::{DialectConfig, ReferencesConfig};
pub use serve::ServeConfig;
