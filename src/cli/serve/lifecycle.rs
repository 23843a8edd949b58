//! Server lifecycle management.

use crate::{
    actor::LiveOptions, config::Config, dialect::DialectSet, engine::RebuildEngine, log,
};
use anyhow::{Context, Result, anyhow};
use crossbeam::channel;
use std::{
    net::SocketAddr,
    path::PathBuf,
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};
use tiny_http::Server;

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Bind to the specified interface and port, with automatic port retry.
pub fn bind_with_retry(
    interface: std::net::IpAddr,
    base_port: u16,
) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;
    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }
    Err(anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        MAX_PORT_RETRIES,
        base_port,
        base_port.saturating_add(MAX_PORT_RETRIES - 1),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

/// Spawn the watch system on its own runtime thread.
///
/// Without an engine, live mode still watches served assets; otherwise
/// nothing is spawned.
pub fn spawn_watch(
    config: &Config,
    serve_root: PathBuf,
    engine: Option<Arc<RebuildEngine>>,
) -> Option<JoinHandle<()>> {
    let live = config.serve.live;
    let engine = match engine {
        Some(engine) => engine,
        None if live => Arc::new(RebuildEngine::new(&serve_root, Arc::new(DialectSet::new()))),
        None => return None,
    };
    let live = live.then(|| LiveOptions {
        serve_root,
        interface: config.serve.interface,
        ws_port: config.serve.ws_port,
        asset_interval: config.serve.asset_interval(),
    });

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    crate::core::register_shutdown(shutdown_tx);
    let coordinator = crate::cli::compile::coordinator(config, engine, live, shutdown_rx);

    Some(thread::spawn(move || {
        if let Err(e) = run_actor_system(coordinator) {
            log!("actor"; "error: {:#}", e);
        }
    }))
}

fn run_actor_system(coordinator: crate::actor::Coordinator) -> Result<()> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    rt.block_on(coordinator.run())
}

/// Wait for the watch system to shut down gracefully (max 2 seconds).
pub fn wait_for_shutdown(handle: Option<JoinHandle<()>>) {
    let Some(handle) = handle else { return };

    for _ in 0..40 {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        thread::sleep(Duration::from_millis(50));
    }
}
