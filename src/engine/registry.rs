//! Compile actions and per-file compile state.
//!
//! ```text
//! Uninitialized ──compile──▶ Compiled ◀──┐
//!       │                      │  ▲      │ recompile
//!       └──────fail──────▶ Failed ┘      │
//!                              └─────────┘
//! ```
//!
//! A failed file keeps its edges and watch subscription; the next
//! modification is the only retry.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use super::CompileError;
use crate::dialect::{Dialect, RenderOptions};

/// Where compiled output goes.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
    /// `None` writes outputs next to their sources
    output_dir: Option<PathBuf>,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>, output_dir: Option<PathBuf>) -> Self {
        Self {
            root: root.into(),
            output_dir,
        }
    }

    /// Output path for `source` with its extension replaced by `ext`.
    pub fn output_for(&self, source: &Path, ext: &str) -> PathBuf {
        let target = match &self.output_dir {
            Some(dir) => match source.strip_prefix(&self.root) {
                Ok(relative) => dir.join(relative),
                // Outside the root: flatten into the output directory
                Err(_) => dir.join(source.file_name().unwrap_or_default()),
            },
            None => source.to_path_buf(),
        };
        target.with_extension(ext)
    }
}

/// Compile outcome for one file.
#[derive(Debug, Clone, Default)]
pub enum FileState {
    #[default]
    Uninitialized,
    Compiled,
    Failed(CompileError),
}

impl FileState {
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Bound transformation for one source file.
///
/// Always reads the file fresh from disk, so invoking it again after a
/// modification needs no invalidation.
#[derive(Debug, Clone)]
pub struct CompileAction {
    pub source: PathBuf,
    pub output: PathBuf,
    pub dialect: Dialect,
}

impl CompileAction {
    /// Read, render and write. Returns the output path.
    pub fn run(&self, options: &RenderOptions) -> Result<PathBuf, CompileError> {
        let content = std::fs::read_to_string(&self.source)
            .map_err(|err| CompileError::io("cannot read", &self.source, err))?;
        self.run_with(&content, options)
    }

    /// Render already-read content and write the output.
    pub fn run_with(&self, content: &str, options: &RenderOptions) -> Result<PathBuf, CompileError> {
        let rendered = self
            .dialect
            .renderer
            .render(&self.source, content, options)?;

        if let Some(parent) = self.output.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|err| CompileError::io("cannot create", parent, err))?;
        }
        std::fs::write(&self.output, rendered)
            .map_err(|err| CompileError::io("cannot write", &self.output, err))?;
        Ok(self.output.clone())
    }
}

struct Entry {
    action: CompileAction,
    state: FileState,
}

/// Compile actions keyed by source path.
#[derive(Default)]
pub struct CompileRegistry {
    entries: FxHashMap<PathBuf, Entry>,
}

impl CompileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `source` to `dialect`. Binding an already bound file is a no-op.
    pub fn bind(&mut self, source: &Path, dialect: &Dialect, layout: &OutputLayout) -> bool {
        if self.entries.contains_key(source) {
            return false;
        }
        let action = CompileAction {
            source: source.to_path_buf(),
            output: layout.output_for(source, &dialect.output),
            dialect: dialect.clone(),
        };
        self.entries.insert(
            source.to_path_buf(),
            Entry {
                action,
                state: FileState::Uninitialized,
            },
        );
        true
    }

    /// The bound action, or `None` for dependency-only files.
    pub fn action(&self, source: &Path) -> Option<&CompileAction> {
        self.entries.get(source).map(|e| &e.action)
    }

    pub fn contains(&self, source: &Path) -> bool {
        self.entries.contains_key(source)
    }

    pub fn state(&self, source: &Path) -> Option<&FileState> {
        self.entries.get(source).map(|e| &e.state)
    }

    pub fn set_state(&mut self, source: &Path, state: FileState) {
        if let Some(entry) = self.entries.get_mut(source) {
            entry.state = state;
        }
    }

    /// Record the result of running a compile action.
    pub fn record(&mut self, source: &Path, result: &Result<PathBuf, CompileError>) {
        let state = match result {
            Ok(_) => FileState::Compiled,
            Err(err) => FileState::Failed(err.clone()),
        };
        self.set_state(source, state);
    }

    pub fn sources(&self) -> impl Iterator<Item = &Path> {
        self.entries.keys().map(PathBuf::as_path)
    }
}
