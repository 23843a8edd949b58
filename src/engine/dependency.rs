//! Bidirectional dependency graph.
//!
//! ```text
//! DependencyGraph
//! ├── dependencies: index.jade  → {layout.jade, mixins.jade}
//! └── dependents:   layout.jade → {index.jade, about.jade}
//!
//! On layout.jade change:
//! 1. Lookup dependents[layout.jade] → affected files
//! 2. Recompile only those files
//! ```
//!
//! The graph is owned by a [`RebuildEngine`](super::RebuildEngine); there is
//! no global instance.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use rustc_hash::{FxHashMap, FxHashSet};

pub type PathSet = FxHashSet<PathBuf>;
type PathSetMap = FxHashMap<PathBuf, PathSet>;

/// Bidirectional dependency graph.
///
/// # Invariants
/// - `dependencies` and `dependents` are mutual inverses
/// - Empty sets are removed, never stored
/// - Self-references are excluded
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// dependent → files it includes/extends
    dependencies: PathSetMap,
    /// dependency → files that include/extend it
    dependents: PathSetMap,
}

impl DependencyGraph {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `dependent`'s output is affected when `dependency` changes.
    ///
    /// Idempotent. Returns `false` if the edge already existed or is a
    /// self-reference.
    pub fn add_edge(&mut self, dependency: &Path, dependent: &Path) -> bool {
        if dependency == dependent {
            return false;
        }
        let inserted = self
            .dependents
            .entry(dependency.to_path_buf())
            .or_default()
            .insert(dependent.to_path_buf());
        self.dependencies
            .entry(dependent.to_path_buf())
            .or_default()
            .insert(dependency.to_path_buf());
        inserted
    }

    /// Remove every edge where `file` is the dependent.
    pub fn clear_dependencies(&mut self, file: &Path) {
        let Some(old) = self.dependencies.remove(file) else {
            return;
        };

        for dependency in old {
            if let Some(users) = self.dependents.get_mut(&dependency) {
                users.remove(file);
                if users.is_empty() {
                    self.dependents.remove(&dependency);
                }
            }
        }
    }

    /// Clear then rebuild `file`'s dependencies in one step.
    pub fn replace_dependencies<'a>(
        &mut self,
        file: &Path,
        targets: impl IntoIterator<Item = &'a PathBuf>,
    ) {
        self.clear_dependencies(file);
        for target in targets {
            self.add_edge(target, file);
        }
    }

    /// Files whose output incorporates `file`.
    #[inline]
    pub fn dependents_of(&self, file: &Path) -> Option<&PathSet> {
        self.dependents.get(file)
    }

    /// Files that `file` includes/extends.
    #[inline]
    pub fn dependencies_of(&self, file: &Path) -> Option<&PathSet> {
        self.dependencies.get(file)
    }

    /// Every file reachable through `dependents` from `file`, excluding
    /// `file` itself, in breadth-first order. Cycles terminate.
    pub fn dependent_closure(&self, file: &Path) -> Vec<PathBuf> {
        let mut seen: FxHashSet<&Path> = FxHashSet::default();
        seen.insert(file);
        let mut queue: VecDeque<&Path> = VecDeque::from([file]);
        let mut order = Vec::new();

        while let Some(current) = queue.pop_front() {
            let Some(users) = self.dependents.get(current) else {
                continue;
            };
            for user in users {
                if seen.insert(user.as_path()) {
                    order.push(user.clone());
                    queue.push_back(user.as_path());
                }
            }
        }

        order
    }

    /// Every file that at least one other file depends on.
    pub fn targets(&self) -> impl Iterator<Item = &Path> {
        self.dependents.keys().map(PathBuf::as_path)
    }

    /// Total number of edges (same count from either index).
    pub fn edge_count(&self) -> usize {
        self.dependencies.values().map(FxHashSet::len).sum()
    }

    /// Check that both indices describe the same edge set.
    #[cfg(test)]
    pub fn is_consistent(&self) -> bool {
        let forward = self
            .dependencies
            .iter()
            .all(|(dependent, deps)| {
                deps.iter().all(|dep| {
                    self.dependents
                        .get(dep)
                        .is_some_and(|users| users.contains(dependent))
                })
            });
        let reverse_count: usize = self.dependents.values().map(FxHashSet::len).sum();
        forward && reverse_count == self.edge_count()
    }
}

// =============================================================================
// Tests
// =============================================================================
