//! `compile` command: initial pass, then optionally watch and serve.

use std::sync::Arc;

use anyhow::{Context, Result};
use crossbeam::channel::{self, Receiver};

use crate::actor::{Coordinator, LiveOptions};
use crate::config::Config;
use crate::dialect::DialectSet;
use crate::engine::{InitialReport, RebuildEngine};
use crate::log;

/// Engine over the configured root and dialects.
pub fn build_engine(config: &Config) -> Arc<RebuildEngine> {
    let dialects = DialectSet::from_config(&config.dialect);
    Arc::new(
        RebuildEngine::new(config.get_root(), Arc::new(dialects))
            .with_recursive(config.compile.recursive)
            .with_mode(config.compile.cascade)
            .with_output_dir(config.compile.output_dir()),
    )
}

/// Run the compile command.
///
/// Compile failures are reported and leave the exit code at zero; only a
/// failed scan or server setup is fatal.
pub fn run(config: &Arc<Config>, watch: bool, serve: bool) -> Result<()> {
    let engine = build_engine(config);
    let report = engine
        .compile_all()
        .with_context(|| format!("cannot scan {}", config.get_root().display()))?;
    log_summary(&report);

    if serve {
        return super::serve::run(config, watch.then_some(engine));
    }
    if watch {
        return watch_until_shutdown(config, engine);
    }
    Ok(())
}

fn log_summary(report: &InitialReport) {
    match (report.compiled.len(), report.failed.len()) {
        (0, 0) => log!("compile"; "nothing to compile"),
        (ok, 0) => log!("compile"; "compiled {} file{}", ok, plural(ok)),
        (ok, failed) => {
            log!("compile"; "compiled {} file{}, {} failed", ok, plural(ok), failed)
        }
    }
}

const fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// Watch without a server, blocking until Ctrl+C.
fn watch_until_shutdown(config: &Config, engine: Arc<RebuildEngine>) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    crate::core::register_shutdown(shutdown_tx);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    runtime.block_on(coordinator(config, engine, None, shutdown_rx).run())
}

/// Coordinator configured from `[compile]`.
pub(crate) fn coordinator(
    config: &Config,
    engine: Arc<RebuildEngine>,
    live: Option<LiveOptions>,
    shutdown_rx: Receiver<()>,
) -> Coordinator {
    let mut coordinator = Coordinator::new(engine)
        .with_watcher(config.compile.watcher, config.compile.poll_interval())
        .with_shutdown_signal(shutdown_rx);
    if let Some(live) = live {
        coordinator = coordinator.with_live(live);
    }
    coordinator
}
