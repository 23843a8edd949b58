//! Reference extraction and resolution.
//!
//! A [`ReferenceSyntax`] only finds raw reference strings in source text.
//! Turning them into paths (default extension, index fallback) is generic
//! and lives in [`resolve`].

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::UnresolvedReference;
use crate::utils::path::lexical_normalize;

/// Template-style `include x` / `extend x` / `extends x` lines.
static INCLUDE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:include|extends?)[ \t]+([^\n]+)").expect("valid regex")
});

/// Stylesheet-style `@import x` lines.
static IMPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*@import[ \t]+([^\n]+)").expect("valid regex"));

/// Directive syntax a dialect uses to pull in other files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceSyntax {
    /// `include`, `extend`, `extends` (jade/pug)
    Include,
    /// `@import` with optional quotes, `url()` and trailing `;` (stylus)
    Import,
}

impl ReferenceSyntax {
    /// Raw reference strings in `content`, in source order.
    pub fn references(self, content: &str) -> Vec<String> {
        let re = match self {
            Self::Include => &*INCLUDE_RE,
            Self::Import => &*IMPORT_RE,
        };

        re.captures_iter(content)
            .filter_map(|caps| caps.get(1))
            .map(|m| match self {
                Self::Include => m.as_str().trim().to_owned(),
                Self::Import => clean_import(m.as_str()),
            })
            .filter(|r| !r.is_empty())
            .collect()
    }

    /// Whether an extension-less reference may point at `dir/index.<ext>`.
    pub const fn index_fallback(self) -> bool {
        matches!(self, Self::Import)
    }
}

/// Strip `url(...)`, quotes and a trailing `;` from an import argument.
fn clean_import(raw: &str) -> String {
    let mut s = raw.trim().trim_end_matches(';').trim_end();
    if let Some(inner) = s.strip_prefix("url(").and_then(|r| r.strip_suffix(')')) {
        s = inner.trim();
    }
    s.trim_matches(|c| c == '"' || c == '\'').to_owned()
}

/// A reference turned into a concrete path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReference {
    pub target: PathBuf,
    /// Set when neither the candidate nor its index fallback exists
    pub unresolved: Option<UnresolvedReference>,
}

/// Resolve `reference` written in `dependent`.
///
/// - relative references resolve against `dependent`'s directory, absolute
///   ones against `root`
/// - a reference whose file name has no `.` gets `.<default_ext>` appended
/// - with `index_fallback`, a missing `x.<ext>` falls back to `x/index.<ext>`
///   when that exists
pub fn resolve(
    root: &Path,
    dependent: &Path,
    reference: &str,
    default_ext: &str,
    index_fallback: bool,
) -> ResolvedReference {
    let base = match reference.strip_prefix('/') {
        Some(rest) => root.join(rest),
        None => dependent
            .parent()
            .map_or_else(|| PathBuf::from(reference), |dir| dir.join(reference)),
    };
    let base = lexical_normalize(&base);

    let has_ext = base
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.contains('.'));

    if has_ext {
        return checked(base, dependent, reference);
    }

    let candidate = with_added_ext(&base, default_ext);
    if index_fallback && !candidate.exists() {
        let index = base.join(format!("index.{default_ext}"));
        if index.exists() {
            return ResolvedReference {
                target: index,
                unresolved: None,
            };
        }
    }

    checked(candidate, dependent, reference)
}

fn checked(target: PathBuf, dependent: &Path, reference: &str) -> ResolvedReference {
    let unresolved = (!target.exists()).then(|| UnresolvedReference {
        dependent: dependent.to_path_buf(),
        reference: reference.to_owned(),
        candidate: target.clone(),
    });
    ResolvedReference { target, unresolved }
}

fn with_added_ext(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn include_syntax_finds_all_directives() {
        let content = "extends layout\n\nblock body\n  include partials/nav\n  include  footer.jade \n  p include is text here\nextend base";
        assert_eq!(
            ReferenceSyntax::Include.references(content),
            vec!["layout", "partials/nav", "footer.jade", "base"]
        );
    }

    #[test]
    fn include_syntax_requires_line_start() {
        let content = "p see include foo\n// extends nothing";
        assert!(ReferenceSyntax::Include.references(content).is_empty());
    }

    #[test]
    fn import_syntax_strips_decoration() {
        let content = "@import 'vars'\n@import \"mixins.styl\";\n  @import url(reset)\nbody\n  color red";
        assert_eq!(
            ReferenceSyntax::Import.references(content),
            vec!["vars", "mixins.styl", "reset"]
        );
    }

    #[test]
    fn default_extension_appended() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("layout.jade"), "").unwrap();

        let resolved = resolve(root, &root.join("index.jade"), "layout", "jade", false);
        assert_eq!(resolved.target, root.join("layout.jade"));
        assert!(resolved.unresolved.is_none());
    }

    #[test]
    fn relative_reference_climbs_directories() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("pages")).unwrap();
        fs::write(root.join("layout.jade"), "").unwrap();

        let resolved = resolve(root, &root.join("pages/a.jade"), "../layout", "jade", false);
        assert_eq!(resolved.target, root.join("layout.jade"));
    }

    #[test]
    fn absolute_reference_is_root_relative() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let resolved = resolve(root, &root.join("a/b/c.jade"), "/shared/nav", "jade", false);
        assert_eq!(resolved.target, root.join("shared/nav.jade"));
    }

    #[test]
    fn index_fallback_when_direct_missing() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("theme")).unwrap();
        fs::write(root.join("theme/index.styl"), "").unwrap();

        let resolved = resolve(root, &root.join("site.styl"), "theme", "styl", true);
        assert_eq!(resolved.target, root.join("theme/index.styl"));
        assert!(resolved.unresolved.is_none());
    }

    #[test]
    fn direct_candidate_preferred_over_index() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("theme")).unwrap();
        fs::write(root.join("theme.styl"), "").unwrap();
        fs::write(root.join("theme/index.styl"), "").unwrap();

        let resolved = resolve(root, &root.join("site.styl"), "theme", "styl", true);
        assert_eq!(resolved.target, root.join("theme.styl"));
    }

    #[test]
    fn missing_target_reported_with_candidate() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        let resolved = resolve(root, &root.join("site.styl"), "ghost", "styl", true);
        assert_eq!(resolved.target, root.join("ghost.styl"));
        let unresolved = resolved.unresolved.unwrap();
        assert_eq!(unresolved.reference, "ghost");
        assert_eq!(unresolved.candidate, root.join("ghost.styl"));
        assert_eq!(unresolved.dependent, root.join("site.styl"));
    }

    #[test]
    fn explicit_extension_not_rewritten() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let resolved = resolve(root, &root.join("index.jade"), "script.js", "jade", false);
        assert_eq!(resolved.target, root.join("script.js"));
        assert!(resolved.unresolved.is_some());
    }
}
