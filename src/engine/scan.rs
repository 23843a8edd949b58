//! Source scanning (reads the filesystem, no engine state).
//!
//! Enumerates regular files under a root whose extension is in a given set.
//! Result order follows the walk and must not be relied upon.

use std::path::{Path, PathBuf};

use jwalk::WalkDir;
use rustc_hash::FxHashSet;

use super::error::ScanError;

/// Extensions recognized by a scan, without the leading dot.
pub type ExtensionSet = FxHashSet<String>;

/// How to walk the root.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    /// Descend into subdirectories
    pub recursive: bool,
    /// Skip files whose name starts with `.` (minification scans)
    pub skip_dotfiles: bool,
    /// Ignore the extension set and accept every regular file
    pub any_extension: bool,
}

impl ScanOptions {
    pub const fn new(recursive: bool) -> Self {
        Self {
            recursive,
            skip_dotfiles: false,
            any_extension: false,
        }
    }

    pub const fn skip_dotfiles(mut self) -> Self {
        self.skip_dotfiles = true;
        self
    }

    pub const fn any_extension(mut self) -> Self {
        self.any_extension = true;
        self
    }
}

/// A discovered source file with its current content.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub extension: String,
    pub content: String,
}

/// Extension after the final `.` of a file name.
///
/// `None` when the name has no dot or ends with one.
pub fn extension_of(path: &Path) -> Option<&str> {
    let name = path.file_name()?.to_str()?;
    let (_, ext) = name.rsplit_once('.')?;
    (!ext.is_empty()).then_some(ext)
}

/// Build an [`ExtensionSet`] from string slices.
pub fn extension_set<'a>(exts: impl IntoIterator<Item = &'a str>) -> ExtensionSet {
    exts.into_iter().map(str::to_owned).collect()
}

/// Scan `root` and read every matching file as text.
pub fn scan(
    root: &Path,
    options: ScanOptions,
    extensions: &ExtensionSet,
) -> Result<Vec<ScannedFile>, ScanError> {
    scan_paths(root, options, extensions)?
        .into_iter()
        .map(|path| {
            let content = std::fs::read_to_string(&path)
                .map_err(|err| ScanError::ReadFile(path.clone(), err))?;
            let extension = extension_of(&path).unwrap_or_default().to_owned();
            Ok(ScannedFile {
                path,
                extension,
                content,
            })
        })
        .collect()
}

/// Scan `root` for matching regular files without reading them.
pub fn scan_paths(
    root: &Path,
    options: ScanOptions,
    extensions: &ExtensionSet,
) -> Result<Vec<PathBuf>, ScanError> {
    // Surface an unreadable root as a scan error rather than an empty walk
    std::fs::read_dir(root).map_err(|err| ScanError::ReadDir(root.to_path_buf(), err))?;

    let max_depth = if options.recursive { usize::MAX } else { 1 };
    let mut files = Vec::new();

    for entry in WalkDir::new(root).skip_hidden(false).max_depth(max_depth) {
        let entry = entry.map_err(|err| ScanError::Walk(root.to_path_buf(), err.to_string()))?;
        if entry.depth == 0 {
            continue;
        }

        let path = entry.path();
        if !accepts(&path, options, extensions) {
            continue;
        }
        // Follows symlinks; sockets, fifos and directories are excluded
        if path.is_file() {
            files.push(path);
        }
    }

    Ok(files)
}

fn accepts(path: &Path, options: ScanOptions, extensions: &ExtensionSet) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if options.skip_dotfiles && name.starts_with('.') {
        return false;
    }
    options.any_extension || extension_of(path).is_some_and(|ext| extensions.contains(ext))
}

// =============================================================================
// Tests
// =============================================================================
