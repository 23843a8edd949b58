//! External-command dialects.
//!
//! Source text goes to the program's stdin, stdout is the compiled output.
//! Arguments may carry placeholders:
//!
//! | Placeholder | Value                          |
//! |-------------|--------------------------------|
//! | `{file}`    | absolute path of the source    |
//! | `{dir}`     | directory containing the source|
//! | `{root}`    | project root                   |

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::{Render, RenderOptions};
use crate::engine::CompileError;
use crate::utils::exec::{Cmd, SILENT_FILTER};

/// `name.ext:line[:column]` as printed by most template/stylesheet compilers.
static POSITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\w\-./\\]+:(\d+)(?::(\d+))?").expect("valid regex")
});

/// Renders by piping source text through an external program.
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    /// Program followed by its arguments
    command: Vec<String>,
}

impl CommandRenderer {
    pub fn new<S: Into<String>>(command: impl IntoIterator<Item = S>) -> Self {
        Self {
            command: command.into_iter().map(Into::into).collect(),
        }
    }

    pub fn program(&self) -> Option<&str> {
        self.command.first().map(String::as_str)
    }

    /// Arguments with placeholders filled in for `source`.
    fn expand_args(&self, source: &Path, options: &RenderOptions) -> Vec<String> {
        let file = source.display().to_string();
        let dir = source
            .parent()
            .map(|d| d.display().to_string())
            .unwrap_or_default();
        let root = options.root.display().to_string();

        self.command
            .iter()
            .skip(1)
            .map(|arg| {
                arg.replace("{file}", &file)
                    .replace("{dir}", &dir)
                    .replace("{root}", &root)
            })
            .collect()
    }
}

impl Render for CommandRenderer {
    fn render(
        &self,
        source: &Path,
        content: &str,
        options: &RenderOptions,
    ) -> Result<String, CompileError> {
        let Some(program) = self.program() else {
            return Err(CompileError::new("dialect command is empty"));
        };
        if which::which(program).is_err() {
            return Err(CompileError::new(format!(
                "`{program}` not found in PATH"
            )));
        }

        let mut cmd = Cmd::new(program)
            .args(self.expand_args(source, options))
            .stdin(content)
            .filter(&SILENT_FILTER);
        if let Some(dir) = source.parent() {
            cmd = cmd.cwd(dir);
        }

        match cmd.run() {
            Ok(output) => Ok(String::from_utf8_lossy(&output.stdout).into_owned()),
            Err(err) => Err(locate(format!("{err:#}"))),
        }
    }
}

/// Build a compile error, picking up the first `line:column` in the text.
fn locate(message: String) -> CompileError {
    let position = POSITION_RE.captures(&message).and_then(|caps| {
        let line = caps.get(1)?.as_str().parse().ok()?;
        let column = caps.get(2).and_then(|c| c.as_str().parse().ok());
        Some((line, column))
    });

    match position {
        Some((line, column)) => CompileError::new(message).at(line, column),
        None => CompileError::new(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn options() -> RenderOptions {
        RenderOptions {
            root: PathBuf::from("/site"),
        }
    }

    #[test]
    fn test_placeholders_expanded() {
        let renderer = CommandRenderer::new(["pug", "--path", "{file}", "-I", "{dir}", "{root}"]);
        let args = renderer.expand_args(Path::new("/site/pages/a.jade"), &options());
        assert_eq!(
            args,
            vec!["--path", "/site/pages/a.jade", "-I", "/site/pages", "/site"]
        );
    }

    #[test]
    fn test_locate_line_and_column() {
        let err = locate("`pug` failed\nindex.jade:3:5\n  unexpected token".into());
        assert_eq!(err.line, Some(3));
        assert_eq!(err.column, Some(5));
    }

    #[test]
    fn test_locate_line_only() {
        let err = locate("stdin:12\nexpected indent".into());
        assert_eq!(err.line, Some(12));
        assert_eq!(err.column, None);
    }

    #[test]
    fn test_locate_ignores_exit_status() {
        let err = locate("`stylus` failed with exit status: 1\n".into());
        assert_eq!(err.line, None);
    }

    #[test]
    fn test_missing_program_is_compile_error() {
        let renderer = CommandRenderer::new(["livefront-no-such-program-xyz"]);
        let err = renderer
            .render(Path::new("/site/a.jade"), "p hi", &options())
            .unwrap_err();
        assert!(err.message.contains("not found in PATH"));
    }

    #[cfg(unix)]
    #[test]
    fn test_stdin_to_stdout() {
        let renderer = CommandRenderer::new(["tr", "a-z", "A-Z"]);
        let dir = tempfile::TempDir::new().unwrap();
        let out = renderer
            .render(&dir.path().join("x.txt"), "shout", &options())
            .unwrap();
        assert_eq!(out, "SHOUT");
    }

    #[cfg(unix)]
    #[test]
    fn test_failure_reports_position() {
        let renderer = CommandRenderer::new(["sh", "-c", "echo 'layout.jade:7:2 bad' >&2; exit 1"]);
        let dir = tempfile::TempDir::new().unwrap();
        let err = renderer
            .render(&dir.path().join("layout.jade"), "", &options())
            .unwrap_err();
        assert_eq!(err.line, Some(7));
        assert_eq!(err.column, Some(2));
    }
}
