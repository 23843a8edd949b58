//! `[compile]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [compile]
//! recursive = false        # Descend into subdirectories
//! output = ""              # Output directory; empty writes next to sources
//! cascade = "transitive"   # "transitive" or "direct"
//! watcher = "poll"         # "poll" or "native"
//! poll_interval = 1000     # Source polling interval in milliseconds
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::actor::WatcherKind;
use crate::engine::CascadeMode;

/// Rebuild engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileConfig {
    /// Scan subdirectories of the root.
    pub recursive: bool,

    /// Output directory mirroring the source layout.
    /// Empty means outputs are written next to their sources.
    pub output: PathBuf,

    /// How far a change propagates through dependents.
    pub cascade: CascadeMode,

    /// Change detection backend.
    pub watcher: WatcherKind,

    /// Source polling interval in milliseconds.
    pub poll_interval: u64,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            recursive: false,
            output: PathBuf::new(),
            cascade: CascadeMode::default(),
            watcher: WatcherKind::default(),
            poll_interval: 1000,
        }
    }
}

impl CompileConfig {
    /// Output directory, `None` when outputs sit next to sources.
    pub fn output_dir(&self) -> Option<PathBuf> {
        (!self.output.as_os_str().is_empty()).then(|| self.output.clone())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval)
    }
}
