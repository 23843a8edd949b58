//! Error types for the rebuild engine.
//!
//! - [`ScanError`]: fatal to the scan that produced it
//! - [`CompileError`]: logged, file marked failed, cascade continues
//! - [`UnresolvedReference`]: reported as a warning, never raised

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Directory listing or file read failed during a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("cannot read directory `{0}`")]
    ReadDir(PathBuf, #[source] std::io::Error),

    #[error("cannot read `{0}`")]
    ReadFile(PathBuf, #[source] std::io::Error),

    #[error("directory walk failed under `{0}`: {1}")]
    Walk(PathBuf, String),
}

/// A renderer or the surrounding file I/O failed for one source file.
#[derive(Debug, Clone)]
pub struct CompileError {
    pub message: String,
    pub line: Option<u32>,
    pub column: Option<u32>,
}

impl CompileError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
            column: None,
        }
    }

    pub fn at(mut self, line: u32, column: Option<u32>) -> Self {
        self.line = Some(line);
        self.column = column;
        self
    }

    pub(crate) fn io(action: &str, path: &std::path::Path, err: std::io::Error) -> Self {
        Self::new(format!("{action} `{}`: {err}", path.display()))
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(col)) => write!(f, "{}:{}: {}", line, col, self.message),
            (Some(line), None) => write!(f, "{}: {}", line, self.message),
            _ => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for CompileError {}

/// A reference whose target exists neither directly nor as an index file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    /// File containing the directive
    pub dependent: PathBuf,
    /// Raw reference text as written
    pub reference: String,
    /// Path the reference resolved to (edge is still recorded against it)
    pub candidate: PathBuf,
}

impl fmt::Display for UnresolvedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "`{}` in {} does not exist (looked for {})",
            self.reference,
            self.dependent.display(),
            self.candidate.display()
        )
    }
}
