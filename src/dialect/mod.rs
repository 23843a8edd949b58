//! Dialects: how a source extension becomes an output file.
//!
//! A [`Dialect`] pairs recognized extensions with an output extension, an
//! optional [`ReferenceSyntax`] for dependency extraction, and a [`Render`]
//! implementation. The transformation itself always happens behind
//! [`Render`]; the engine never knows which language it is compiling.
//!
//! ```text
//! DialectSet
//! ├── jade      [jade]           → html  include  (pug)
//! ├── stylus    [styl, stylus]   → css   import   (stylus)
//! └── markdown  [md, markdown]   → html  -        (pulldown-cmark)
//! ```

pub mod command;
pub mod markdown;
pub mod minify;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::DialectConfig;
use crate::engine::{CompileError, ExtensionSet, ReferenceSyntax};

pub use command::CommandRenderer;
pub use markdown::{MarkdownOptions, MarkdownRenderer};
pub use minify::{MinifyKind, MinifyRenderer};

/// Values renderers may need besides the source itself.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Project root (substituted for `{root}` in dialect commands)
    pub root: PathBuf,
}

/// Source text to output text.
///
/// Implementations must be safe to call repeatedly and concurrently for
/// different files.
pub trait Render: Send + Sync {
    fn render(
        &self,
        source: &Path,
        content: &str,
        options: &RenderOptions,
    ) -> Result<String, CompileError>;
}

/// One supported source language.
#[derive(Clone)]
pub struct Dialect {
    pub name: String,
    /// Recognized extensions, first one is the default for references
    pub extensions: Vec<String>,
    /// Extension written for compiled output
    pub output: String,
    /// Dependency directives, `None` for dialects without includes
    pub references: Option<ReferenceSyntax>,
    pub renderer: Arc<dyn Render>,
}

impl Dialect {
    pub fn new(
        name: impl Into<String>,
        extensions: &[&str],
        output: impl Into<String>,
        references: Option<ReferenceSyntax>,
        renderer: Arc<dyn Render>,
    ) -> Self {
        Self {
            name: name.into(),
            extensions: extensions.iter().map(|e| (*e).to_owned()).collect(),
            output: output.into(),
            references,
            renderer,
        }
    }

    /// Extension appended to references written without one.
    pub fn default_extension(&self) -> &str {
        self.extensions.first().map_or("", String::as_str)
    }
}

impl fmt::Debug for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dialect")
            .field("name", &self.name)
            .field("extensions", &self.extensions)
            .field("output", &self.output)
            .field("references", &self.references)
            .finish_non_exhaustive()
    }
}

impl From<&DialectConfig> for Dialect {
    fn from(config: &DialectConfig) -> Self {
        Self {
            name: config.name.clone(),
            extensions: config.extensions.clone(),
            output: config.output.clone(),
            references: config.references.syntax(),
            renderer: Arc::new(CommandRenderer::new(config.command.iter().cloned())),
        }
    }
}

/// Dialects keyed by name; lookup by extension.
#[derive(Debug, Clone, Default)]
pub struct DialectSet {
    dialects: Vec<Dialect>,
}

impl DialectSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// jade, stylus and markdown.
    pub fn builtin() -> Self {
        let mut set = Self::new();
        set.insert(Dialect::new(
            "jade",
            &["jade"],
            "html",
            Some(ReferenceSyntax::Include),
            Arc::new(CommandRenderer::new(["pug", "--path", "{file}"])),
        ));
        set.insert(Dialect::new(
            "stylus",
            &["styl", "stylus"],
            "css",
            Some(ReferenceSyntax::Import),
            Arc::new(CommandRenderer::new([
                "stylus",
                "--compress",
                "--include",
                "{dir}",
            ])),
        ));
        set.insert(Dialect::new(
            "markdown",
            &["md", "markdown"],
            "html",
            None,
            Arc::new(MarkdownRenderer::new(MarkdownOptions::all())),
        ));
        set
    }

    /// Built-ins overridden (by name) or extended by configured dialects.
    pub fn from_config(configs: &[DialectConfig]) -> Self {
        let mut set = Self::builtin();
        for config in configs {
            set.insert(Dialect::from(config));
        }
        set
    }

    /// Add a dialect, replacing any existing one with the same name.
    pub fn insert(&mut self, dialect: Dialect) {
        match self.dialects.iter_mut().find(|d| d.name == dialect.name) {
            Some(slot) => *slot = dialect,
            None => self.dialects.push(dialect),
        }
    }

    /// Dialect handling `ext`. Later dialects win on overlapping extensions.
    pub fn for_extension(&self, ext: &str) -> Option<&Dialect> {
        self.dialects
            .iter()
            .rev()
            .find(|d| d.extensions.iter().any(|e| e == ext))
    }

    pub fn get(&self, name: &str) -> Option<&Dialect> {
        self.dialects.iter().find(|d| d.name == name)
    }

    /// Every recognized source extension.
    pub fn extensions(&self) -> ExtensionSet {
        self.dialects
            .iter()
            .flat_map(|d| d.extensions.iter().cloned())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dialect> {
        self.dialects.iter()
    }

    pub fn len(&self) -> usize {
        self.dialects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dialects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReferencesConfig;

    #[test]
    fn test_builtin_lookup() {
        let set = DialectSet::builtin();
        assert_eq!(set.for_extension("jade").unwrap().name, "jade");
        assert_eq!(set.for_extension("stylus").unwrap().output, "css");
        assert_eq!(set.for_extension("md").unwrap().references, None);
        assert!(set.for_extension("html").is_none());
    }

    #[test]
    fn test_default_extension_is_first() {
        let set = DialectSet::builtin();
        assert_eq!(set.get("stylus").unwrap().default_extension(), "styl");
    }

    #[test]
    fn test_config_overrides_by_name() {
        let config = DialectConfig {
            name: "jade".into(),
            extensions: vec!["jade".into(), "pug".into()],
            output: "html".into(),
            references: ReferencesConfig::Include,
            command: vec!["npx".into(), "pug".into()],
        };
        let set = DialectSet::from_config(&[config]);
        assert_eq!(set.len(), 3);
        assert_eq!(set.for_extension("pug").unwrap().name, "jade");
    }

    #[test]
    fn test_config_adds_new_dialect() {
        let config = DialectConfig {
            name: "less".into(),
            extensions: vec!["less".into()],
            output: "css".into(),
            references: ReferencesConfig::Import,
            command: vec!["lessc".into(), "-".into()],
        };
        let set = DialectSet::from_config(&[config]);
        assert_eq!(set.len(), 4);
        assert!(set.extensions().contains("less"));
        assert_eq!(
            set.for_extension("less").unwrap().references,
            Some(ReferenceSyntax::Import)
        );
    }
}
