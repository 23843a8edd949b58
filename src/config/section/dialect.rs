//! `[[dialect]]` tables.
//!
//! Each table declares an external-command dialect. A dialect whose `name`
//! matches a built-in (jade, stylus, markdown) replaces it.
//!
//! ```toml
//! [[dialect]]
//! name = "less"
//! extensions = ["less"]
//! output = "css"
//! references = "import"    # include | import | none
//! command = ["lessc", "--include-path={dir}", "-"]
//! ```
//!
//! `{file}`, `{dir}` and `{root}` in `command` are substituted per source.

use serde::{Deserialize, Serialize};

use crate::engine::ReferenceSyntax;

/// One dialect table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialectConfig {
    pub name: String,
    /// First entry is the default extension for extension-less references.
    pub extensions: Vec<String>,
    /// Output extension, without the dot.
    pub output: String,
    #[serde(default)]
    pub references: ReferencesConfig,
    /// Program and arguments; source text arrives on stdin.
    pub command: Vec<String>,
}

/// Reference directive syntax, or none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferencesConfig {
    Include,
    Import,
    #[default]
    None,
}

impl ReferencesConfig {
    pub const fn syntax(self) -> Option<ReferenceSyntax> {
        match self {
            Self::Include => Some(ReferenceSyntax::Include),
            Self::Import => Some(ReferenceSyntax::Import),
            Self::None => None,
        }
    }
}

impl DialectConfig {
    /// Reason this table cannot be used, if any.
    pub fn problem(&self) -> Option<String> {
        if self.name.trim().is_empty() {
            return Some("dialect without a name".into());
        }
        if self.extensions.iter().all(|e| e.trim().is_empty()) {
            return Some(format!("dialect `{}` has no extensions", self.name));
        }
        if self.command.is_empty() {
            return Some(format!("dialect `{}` has an empty command", self.name));
        }
        None
    }
}
