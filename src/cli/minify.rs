//! `minify` command.
//!
//! The degenerate rebuild: scan without dotfiles, no dependency extraction,
//! no watch. Every matched file is bound to a one-off compile action whose
//! renderer is the CSS or JS minifier.

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use regex::Regex;

use super::MinifyArgs;
use crate::config::Config;
use crate::dialect::minify::{MinifyKind, MinifyRenderer};
use crate::dialect::{Dialect, RenderOptions};
use crate::engine::{CompileAction, ExtensionSet, ScanOptions, extension_of, scan_paths};
use crate::log;

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*name\s*\}\}").unwrap());
static EXTENSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*extension\s*\}\}").unwrap());

/// One file to minify.
#[derive(Debug, PartialEq, Eq)]
struct Job {
    source: PathBuf,
    output: PathBuf,
    kind: MinifyKind,
}

/// Why a matched file is left alone.
#[derive(Debug, PartialEq, Eq)]
enum Skip {
    UnknownType,
    AlreadyMinified,
}

/// Run the minify command.
pub fn run(config: &Config, args: &MinifyArgs) -> Result<()> {
    let Some(pattern) = file_pattern(args) else {
        bail!(
            "provide a regular expression or --css/--js to select the files to minify"
        );
    };
    let filter = Regex::new(&pattern).with_context(|| format!("invalid pattern `{pattern}`"))?;

    let mut recursive = args.recursive;
    if !recursive && pattern.contains('/') {
        log!("minify"; "pattern names another directory, searching recursively");
        recursive = true;
    }

    let root = config.get_root();
    let options = ScanOptions::new(recursive).skip_dotfiles().any_extension();
    let files = scan_paths(root, options, &ExtensionSet::default())
        .with_context(|| format!("cannot scan {}", root.display()))?;

    let forced = match args.kind.as_deref() {
        Some(kind) => Some(
            MinifyKind::from_type(kind)
                .with_context(|| format!("unsupported type `{kind}`, expected css or js"))?,
        ),
        None => None,
    };

    let mut jobs = Vec::new();
    for path in files {
        let relative = relative_name(root, &path);
        if !filter.is_match(&relative) {
            continue;
        }
        match plan(&path, forced, &args.out, args.overwrite) {
            Ok(job) => jobs.push(job),
            Err(Skip::UnknownType) => log!(
                "minify";
                "skipping {}: cannot determine type, use --type", relative
            ),
            Err(Skip::AlreadyMinified) => {
                log!("minify"; "skipping {}: already minified", relative)
            }
        }
    }

    if jobs.is_empty() {
        log!("minify"; "no files matched `{}`", pattern);
        return Ok(());
    }

    let render_options = RenderOptions {
        root: root.to_path_buf(),
    };
    let failed = jobs
        .par_iter()
        .filter(|job| !minify_one(root, job, &render_options))
        .count();

    if failed > 0 {
        log!("minify"; "{} of {} files failed", failed, jobs.len());
    }
    Ok(())
}

fn minify_one(root: &Path, job: &Job, options: &RenderOptions) -> bool {
    let ext = job.kind.extension();
    let action = CompileAction {
        source: job.source.clone(),
        output: job.output.clone(),
        dialect: Dialect::new(
            ext,
            &[ext],
            ext,
            None,
            Arc::new(MinifyRenderer(job.kind)),
        ),
    };
    let source = relative_name(root, &job.source);
    match action.run(options) {
        Ok(output) => {
            log!("minify"; "minified {} to {}", source, relative_name(root, &output));
            true
        }
        Err(err) => {
            log!("error"; "{}: {}", source, err);
            false
        }
    }
}

/// Regex selecting files: shortcuts win, `--plain` escapes the pattern.
fn file_pattern(args: &MinifyArgs) -> Option<String> {
    let mut types = Vec::new();
    if args.css {
        types.push("css");
    }
    if args.js {
        types.push("js");
    }
    if !types.is_empty() {
        return Some(format!(r"\.({})$", types.join("|")));
    }

    let pattern = args.pattern.as_deref().filter(|p| !p.is_empty())?;
    Some(if args.plain {
        format!("{}$", regex::escape(pattern))
    } else {
        pattern.to_owned()
    })
}

/// Decide type and output name for one matched file.
///
/// With a forced type the whole file name is the `{{ name }}`.
fn plan(
    path: &Path,
    forced: Option<MinifyKind>,
    template: &str,
    overwrite: bool,
) -> Result<Job, Skip> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let (kind, extension, stem) = match forced {
        Some(kind) => (kind, kind.extension().to_owned(), file_name.clone()),
        None => {
            let ext = extension_of(path).ok_or(Skip::UnknownType)?;
            let kind = MinifyKind::from_type(ext).ok_or(Skip::UnknownType)?;
            let stem = file_name[..file_name.len() - ext.len() - 1].to_owned();
            (kind, ext.to_owned(), stem)
        }
    };

    if extension_of(Path::new(&stem)) == Some("min") {
        return Err(Skip::AlreadyMinified);
    }

    let output = if overwrite {
        path.to_path_buf()
    } else {
        let name = NAME_RE.replace(template, stem.as_str());
        let name = EXTENSION_RE.replace(&name, extension.as_str());
        path.with_file_name(name.as_ref())
    };

    Ok(Job {
        source: path.to_path_buf(),
        output,
        kind,
    })
}

/// Root-relative display name with `/` separators.
fn relative_name(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}
