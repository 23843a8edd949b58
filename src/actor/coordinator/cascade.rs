use std::path::{Path, PathBuf};

use super::{ASSET_EXTENSIONS, Context};
use crate::actor::messages::{HubMsg, WatchTag};
use crate::engine::{CascadeReport, RebuildEngine, extension_of};
use crate::logger::{status_error, status_success, status_warning};
use crate::utils::path::route::url_path_of;

impl Context {
    /// Cascade a source change, then subscribe new targets and announce
    /// newly written outputs.
    pub(super) async fn on_source_change(&self, path: PathBuf) {
        let Some(report) = self.engine.cascade(&path).await else {
            return;
        };
        report_status(&self.engine, &report);

        for target in &report.dependencies {
            self.subscribe(target, WatchTag::Source);
        }

        let Some(hub) = &self.hub else {
            return;
        };
        for output in report.outputs() {
            if !is_asset(output) {
                continue;
            }
            // Already-watched outputs are reported by their own poller
            let added = self
                .watcher
                .watch(output, hub.asset_interval, WatchTag::Asset)
                .unwrap_or(false);
            if added && let Some(canonical) = url_path_of(&hub.serve_root, output) {
                let _ = hub.tx.send(HubMsg::FileModified(canonical)).await;
            }
        }
    }

    /// Forward an asset change to the hub in canonical form.
    pub(super) async fn on_asset_change(&self, path: &Path) {
        let Some(hub) = &self.hub else {
            return;
        };
        let Some(canonical) = url_path_of(&hub.serve_root, path) else {
            crate::debug!("live"; "{} is outside the serve root", path.display());
            return;
        };
        let _ = hub.tx.send(HubMsg::FileModified(canonical)).await;
    }
}

pub(super) fn is_asset(path: &Path) -> bool {
    extension_of(path).is_some_and(|ext| ASSET_EXTENSIONS.contains(&ext))
}

/// Show a cascade result on the watch status line.
fn report_status(engine: &RebuildEngine, report: &CascadeReport) {
    if !report.failed.is_empty() {
        let summary = format!("failed: {}", names(engine, report.failed.iter().map(|(p, _)| p)));
        let detail = report
            .failed
            .iter()
            .map(|(path, err)| format!("{}: {}", engine.display_path(path), err))
            .collect::<Vec<_>>()
            .join("\n");
        status_error(&summary, &detail);
    } else if !report.unresolved.is_empty() {
        let detail = report
            .unresolved
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        status_warning(&detail);
    } else if !report.recovered.is_empty() {
        status_success(&format!("fixed: {}", names(engine, report.recovered.iter())));
    } else if !report.compiled.is_empty() {
        let compiled = names(engine, report.compiled.iter().map(|(p, _)| p));
        status_success(&format!("compiled: {compiled}"));
    } else {
        status_success(&format!("changed: {}", engine.display_path(&report.trigger)));
    }

    for path in &report.skipped {
        crate::debug!("watch"; "skipped {} (no compile action)", engine.display_path(path));
    }
}

fn names<'a>(engine: &RebuildEngine, paths: impl Iterator<Item = &'a PathBuf>) -> String {
    paths
        .map(|p| engine.display_path(p).into_owned())
        .collect::<Vec<_>>()
        .join(", ")
}
