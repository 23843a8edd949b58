//! Incremental, dependency-aware rebuild engine.
//!
//! # Architecture
//!
//! ```text
//! compile_all()                         cascade(F)
//! ├── scan root                         ├── gate: one cascade per file
//! ├── bind CompileAction per file       ├── re-read F
//! ├── record dependency edges           ├── replace F's edges (one step)
//! └── compile everything (rayon)        ├── compile F (if bound)
//!                                       └── compile dependents of F
//! ```
//!
//! The engine owns its graph and registry; share it with `Arc`. Locks are
//! `parking_lot` and never held across an `.await`.

mod dependency;
mod error;
mod extract;
mod gate;
mod registry;
mod scan;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::dialect::{Dialect, DialectSet, RenderOptions};
use crate::logger::ProgressLine;
use crate::utils::path::normalize_path;
use crate::{debug, log};

pub use dependency::{DependencyGraph, PathSet};
pub use error::{CompileError, ScanError, UnresolvedReference};
pub use extract::{ReferenceSyntax, ResolvedReference, resolve};
pub use gate::CascadeGate;
pub use registry::{CompileAction, CompileRegistry, FileState, OutputLayout};
pub use scan::{ExtensionSet, ScanOptions, ScannedFile, extension_of, extension_set, scan, scan_paths};

/// How far a change propagates through the dependency graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CascadeMode {
    /// Only files that reference the changed file directly
    Direct,
    /// Every file reachable through dependents
    #[default]
    Transitive,
}

/// Outcome of the initial compile pass.
#[derive(Debug, Default)]
pub struct InitialReport {
    /// `(source, output)` pairs written
    pub compiled: Vec<(PathBuf, PathBuf)>,
    pub failed: Vec<(PathBuf, CompileError)>,
    pub unresolved: Vec<UnresolvedReference>,
}

/// Outcome of one watch-triggered cascade.
#[derive(Debug)]
pub struct CascadeReport {
    pub trigger: PathBuf,
    /// `(source, output)` pairs written, trigger first
    pub compiled: Vec<(PathBuf, PathBuf)>,
    pub failed: Vec<(PathBuf, CompileError)>,
    /// Dependents without a compile action
    pub skipped: Vec<PathBuf>,
    pub unresolved: Vec<UnresolvedReference>,
    /// Compiled files whose previous compile had failed
    pub recovered: Vec<PathBuf>,
    /// Trigger's dependency targets after re-derivation, plus targets first
    /// reached through dependency-only files
    pub dependencies: Vec<PathBuf>,
}

impl CascadeReport {
    fn new(trigger: &Path) -> Self {
        Self {
            trigger: trigger.to_path_buf(),
            compiled: Vec::new(),
            failed: Vec::new(),
            skipped: Vec::new(),
            unresolved: Vec::new(),
            recovered: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    fn push(&mut self, source: &Path, result: Result<PathBuf, CompileError>) {
        match result {
            Ok(output) => self.compiled.push((source.to_path_buf(), output)),
            Err(err) => self.failed.push((source.to_path_buf(), err)),
        }
    }

    /// Output paths written by this cascade.
    pub fn outputs(&self) -> impl Iterator<Item = &Path> {
        self.compiled.iter().map(|(_, output)| output.as_path())
    }
}

/// Dependency targets extracted from one file's content.
struct Extracted {
    targets: Vec<PathBuf>,
    unresolved: Vec<UnresolvedReference>,
}

/// Rebuild engine for one project root.
pub struct RebuildEngine {
    root: PathBuf,
    recursive: bool,
    mode: CascadeMode,
    layout: OutputLayout,
    dialects: Arc<DialectSet>,
    graph: RwLock<DependencyGraph>,
    registry: RwLock<CompileRegistry>,
    gate: CascadeGate,
    options: RenderOptions,
}

impl RebuildEngine {
    pub fn new(root: &Path, dialects: Arc<DialectSet>) -> Self {
        let root = normalize_path(root);
        Self {
            layout: OutputLayout::new(&root, None),
            options: RenderOptions { root: root.clone() },
            root,
            recursive: false,
            mode: CascadeMode::default(),
            dialects,
            graph: RwLock::new(DependencyGraph::new()),
            registry: RwLock::new(CompileRegistry::new()),
            gate: CascadeGate::new(),
        }
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_mode(mut self, mode: CascadeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Write outputs under `dir` instead of next to their sources.
    pub fn with_output_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.layout = OutputLayout::new(&self.root, dir.map(|d| normalize_path(&d)));
        self
    }

    /// Path relative to the root for log output.
    pub fn display_path<'a>(&self, path: &'a Path) -> std::borrow::Cow<'a, str> {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
    }

    fn dialect_for(&self, path: &Path) -> Option<&Dialect> {
        extension_of(path).and_then(|ext| self.dialects.for_extension(ext))
    }

    // =========================================================================
    // Initial pass
    // =========================================================================

    /// Scan the root, bind and compile every source, record all edges.
    ///
    /// Only a scan failure is an error; compile failures are collected in
    /// the report.
    pub fn compile_all(&self) -> Result<InitialReport, ScanError> {
        let options = ScanOptions::new(self.recursive);
        let files = scan(&self.root, options, &self.dialects.extensions())?;
        let mut report = InitialReport::default();

        // Bind actions and collect per-dialect counts for the progress line
        let mut jobs = Vec::with_capacity(files.len());
        {
            let mut registry = self.registry.write();
            for file in &files {
                let Some(dialect) = self.dialects.for_extension(&file.extension) else {
                    continue;
                };
                registry.bind(&file.path, dialect, &self.layout);
                if let Some(action) = registry.action(&file.path) {
                    jobs.push((action.clone(), file));
                }
            }
        }

        report.unresolved = self.record_initial_dependencies(&files);

        let counts = self
            .dialects
            .iter()
            .map(|d| {
                let n = jobs.iter().filter(|(a, _)| a.dialect.name == d.name).count();
                (d.name.clone(), n)
            })
            .collect::<Vec<_>>();
        let progress = ProgressLine::new(&counts);

        let results: Vec<_> = jobs
            .par_iter()
            .map(|(action, file)| {
                let result = action.run_with(&file.content, &self.options);
                progress.inc(&action.dialect.name);
                (action.source.clone(), result)
            })
            .collect();
        progress.finish();

        let mut registry = self.registry.write();
        for (source, result) in results {
            registry.record(&source, &result);
            match result {
                Ok(output) => report.compiled.push((source, output)),
                Err(err) => {
                    log!("error"; "{}: {}", self.display_path(&source), err);
                    report.failed.push((source, err));
                }
            }
        }
        for unresolved in &report.unresolved {
            log!("warning"; "{}", unresolved);
        }

        Ok(report)
    }

    /// Record edges for scanned files, then for any dependency targets that
    /// exist on disk but were not scanned, until no new targets appear.
    fn record_initial_dependencies(&self, files: &[ScannedFile]) -> Vec<UnresolvedReference> {
        let mut unresolved = Vec::new();
        let mut seen: FxHashSet<PathBuf> = files.iter().map(|f| f.path.clone()).collect();
        let mut pending = Vec::new();

        for file in files {
            let (_, fresh) = self.record_edges(&file.path, &file.content, &mut seen, &mut unresolved);
            pending.extend(fresh);
        }
        self.follow_dependency_only(pending, &mut seen, &mut unresolved);

        unresolved
    }

    /// Replace `path`'s edges from `content`.
    ///
    /// Returns all targets, plus the targets never expanded before that
    /// exist on disk, with their contents.
    fn record_edges(
        &self,
        path: &Path,
        content: &str,
        seen: &mut FxHashSet<PathBuf>,
        unresolved: &mut Vec<UnresolvedReference>,
    ) -> (Vec<PathBuf>, Vec<(PathBuf, String)>) {
        let Some(extracted) = self
            .dialect_for(path)
            .and_then(|dialect| self.extract(path, dialect, content))
        else {
            return (Vec::new(), Vec::new());
        };

        let mut fresh = Vec::new();
        for target in &extracted.targets {
            if seen.insert(target.clone())
                && !self.is_expanded(target)
                && let Ok(content) = std::fs::read_to_string(target)
            {
                fresh.push((target.clone(), content));
            }
        }
        self.graph.write().replace_dependencies(path, &extracted.targets);
        unresolved.extend(extracted.unresolved);
        (extracted.targets, fresh)
    }

    /// Expand dependency-only files until no new targets
    /// appear. Returns every target reached along the way.
    fn follow_dependency_only(
        &self,
        mut pending: Vec<(PathBuf, String)>,
        seen: &mut FxHashSet<PathBuf>,
        unresolved: &mut Vec<UnresolvedReference>,
    ) -> Vec<PathBuf> {
        let mut reached = Vec::new();
        while let Some((path, content)) = pending.pop() {
            debug!("deps"; "dependency-only file {}", self.display_path(&path));
            let (targets, fresh) = self.record_edges(&path, &content, seen, unresolved);
            reached.extend(targets);
            pending.extend(fresh);
        }
        reached
    }

    /// Whether `path`'s own references are already in the graph: it is a
    /// bound source, or an earlier pass reached it as a dependency.
    fn is_expanded(&self, path: &Path) -> bool {
        if self.registry.read().contains(path) {
            return true;
        }
        let graph = self.graph.read();
        graph.dependents_of(path).is_some() || graph.dependencies_of(path).is_some()
    }

    /// Resolve every reference in `content`. `None` when the dialect has no
    /// reference syntax.
    fn extract(&self, path: &Path, dialect: &Dialect, content: &str) -> Option<Extracted> {
        let syntax = dialect.references?;
        let mut extracted = Extracted {
            targets: Vec::new(),
            unresolved: Vec::new(),
        };

        for reference in syntax.references(content) {
            let resolved = resolve(
                &self.root,
                path,
                &reference,
                dialect.default_extension(),
                syntax.index_fallback(),
            );
            if resolved.target == path {
                continue;
            }
            if let Some(unresolved) = resolved.unresolved {
                extracted.unresolved.push(unresolved);
            }
            if !extracted.targets.contains(&resolved.target) {
                extracted.targets.push(resolved.target);
            }
        }

        Some(extracted)
    }

    // =========================================================================
    // Watch-triggered cascade
    // =========================================================================

    /// Recompile `path` and everything that depends on it.
    ///
    /// Returns `None` when the event was coalesced into an already queued
    /// cascade or the file no longer exists.
    pub async fn cascade(self: &Arc<Self>, path: &Path) -> Option<CascadeReport> {
        let _guard = self.gate.enter(path).await?;
        let mut report = CascadeReport::new(path);

        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("watch"; "{} removed, waiting for it to return", self.display_path(path));
                return None;
            }
            Err(err) => {
                report
                    .failed
                    .push((path.to_path_buf(), CompileError::io("cannot read", path, err)));
                return Some(report);
            }
        };

        // Edges are swapped before compiling, so a failure keeps the new set
        let engine = Arc::clone(self);
        let trigger = path.to_path_buf();
        let edges = tokio::task::spawn_blocking(move || {
            let (dependencies, unresolved) = engine.rerecord(&trigger, &content);
            (content, dependencies, unresolved)
        });
        let content = match edges.await {
            Ok((content, dependencies, unresolved)) => {
                report.dependencies = dependencies;
                report.unresolved = unresolved;
                content
            }
            Err(err) => {
                report.failed.push((
                    path.to_path_buf(),
                    CompileError::new(format!("dependency task failed: {err}")),
                ));
                return Some(report);
            }
        };

        let action = self.registry.read().action(path).cloned();
        if let Some(action) = action {
            let result = self.run_action(action, Some(content)).await;
            self.record_result(path, result, &mut report);
        }

        for dependent in self.affected_by(path) {
            let action = self.registry.read().action(&dependent).cloned();
            let Some(action) = action else {
                report.skipped.push(dependent);
                continue;
            };
            let result = self.run_action(action, None).await;
            self.record_result(&dependent, result, &mut report);
        }

        Some(report)
    }

    /// Re-derive `path`'s edges and expand any dependency-only files it
    /// newly reaches. Returns every target reached.
    fn rerecord(&self, path: &Path, content: &str) -> (Vec<PathBuf>, Vec<UnresolvedReference>) {
        let mut seen = FxHashSet::default();
        seen.insert(path.to_path_buf());
        let mut unresolved = Vec::new();

        let (mut targets, fresh) = self.record_edges(path, content, &mut seen, &mut unresolved);
        for target in self.follow_dependency_only(fresh, &mut seen, &mut unresolved) {
            if !targets.contains(&target) {
                targets.push(target);
            }
        }
        (targets, unresolved)
    }

    fn record_result(
        &self,
        source: &Path,
        result: Result<PathBuf, CompileError>,
        report: &mut CascadeReport,
    ) {
        let mut registry = self.registry.write();
        let was_failed = registry.state(source).is_some_and(FileState::is_failed);
        registry.record(source, &result);
        drop(registry);

        if was_failed && result.is_ok() {
            report.recovered.push(source.to_path_buf());
        }
        report.push(source, result);
    }

    /// Files to recompile when `path` changes, per the cascade mode.
    pub fn affected_by(&self, path: &Path) -> Vec<PathBuf> {
        let graph = self.graph.read();
        match self.mode {
            CascadeMode::Direct => {
                let mut direct: Vec<_> = graph
                    .dependents_of(path)
                    .map(|set| set.iter().cloned().collect())
                    .unwrap_or_default();
                direct.sort();
                direct
            }
            CascadeMode::Transitive => graph.dependent_closure(path),
        }
    }

    /// Run a compile action on the blocking pool.
    async fn run_action(
        &self,
        action: CompileAction,
        content: Option<String>,
    ) -> Result<PathBuf, CompileError> {
        let options = self.options.clone();
        let task = tokio::task::spawn_blocking(move || match content {
            Some(content) => action.run_with(&content, &options),
            None => action.run(&options),
        });
        task.await
            .unwrap_or_else(|err| Err(CompileError::new(format!("compile task failed: {err}"))))
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Every path the watcher should subscribe to: bound sources plus every
    /// dependency target, including targets that do not exist yet.
    pub fn watch_targets(&self) -> Vec<PathBuf> {
        let mut targets: FxHashSet<PathBuf> = self
            .registry
            .read()
            .sources()
            .map(Path::to_path_buf)
            .collect();
        targets.extend(self.graph.read().targets().map(Path::to_path_buf));
        let mut targets: Vec<_> = targets.into_iter().collect();
        targets.sort();
        targets
    }

    pub fn dependents_of(&self, path: &Path) -> PathSet {
        self.graph
            .read()
            .dependents_of(path)
            .cloned()
            .unwrap_or_default()
    }

    pub fn dependencies_of(&self, path: &Path) -> PathSet {
        self.graph
            .read()
            .dependencies_of(path)
            .cloned()
            .unwrap_or_default()
    }

    pub fn state(&self, path: &Path) -> Option<FileState> {
        self.registry.read().state(path).cloned()
    }
}
