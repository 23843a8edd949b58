//! Actor Coordinator - Wires up the Watch/Reload System
//!
//! The Coordinator is a thin orchestrator that:
//! - Creates communication channels
//! - Subscribes engine sources and served assets to the watcher
//! - Starts the live-reload hub
//! - Runs the event loop until shutdown
//!
//! ```text
//! Watcher --Source--> cascade (task per event) --outputs--+
//!    |                                                    v
//!    +----Asset------------------------------------> WsActor
//! ```

mod cascade;
mod runtime;

#[cfg(test)]
mod tests;

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::fs::{Watcher, WatcherKind, create_watcher};
use super::messages::{HubMsg, WatchEvent, WatchTag};
use super::ws::WsActor;
use crate::engine::{RebuildEngine, ScanOptions, extension_set, scan_paths};

const CHANNEL_BUFFER: usize = 64;

/// Extensions the hub watches under the serve root
const ASSET_EXTENSIONS: [&str; 3] = ["html", "css", "js"];

/// Live-reload settings.
#[derive(Debug, Clone)]
pub struct LiveOptions {
    /// Directory served over HTTP; canonical paths are relative to it
    pub serve_root: PathBuf,
    /// Interface the HTTP server listens on; the WebSocket binds the same
    pub interface: IpAddr,
    pub ws_port: u16,
    pub asset_interval: Duration,
}

/// Coordinator - wires up and runs the watch system.
pub struct Coordinator {
    engine: Arc<RebuildEngine>,
    watcher: WatcherKind,
    poll_interval: Duration,
    live: Option<LiveOptions>,
    shutdown_rx: Option<Receiver<()>>,
}

impl Coordinator {
    pub fn new(engine: Arc<RebuildEngine>) -> Self {
        Self {
            engine,
            watcher: WatcherKind::default(),
            poll_interval: Duration::from_millis(1000),
            live: None,
            shutdown_rx: None,
        }
    }

    /// Set watcher backend and source polling interval.
    pub fn with_watcher(mut self, kind: WatcherKind, poll_interval: Duration) -> Self {
        self.watcher = kind;
        self.poll_interval = poll_interval;
        self
    }

    /// Enable the live-reload hub.
    pub fn with_live(mut self, live: LiveOptions) -> Self {
        self.live = Some(live);
        self
    }

    /// Set shutdown signal receiver.
    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Run until the shutdown signal (or forever without one).
    pub async fn run(mut self) -> Result<()> {
        let (event_tx, event_rx) = mpsc::channel::<WatchEvent>(CHANNEL_BUFFER);
        let watcher = create_watcher(self.watcher, event_tx).context("watcher failed")?;

        let hub = match self.live.take() {
            Some(live) => start_hub(live),
            None => None,
        };
        let hub_tx = hub.as_ref().map(|h| h.tx.clone());

        let ctx = Arc::new(Context {
            engine: self.engine,
            watcher,
            poll_interval: self.poll_interval,
            hub,
        });
        ctx.subscribe_sources();
        ctx.subscribe_assets();

        crate::debug!("actor"; "start");
        runtime::run_loop(ctx, event_rx, self.shutdown_rx.take()).await;

        if let Some(tx) = hub_tx {
            let _ = tx.send(HubMsg::Shutdown).await;
        }
        crate::debug!("actor"; "stopped");
        Ok(())
    }
}

/// Bind the WebSocket port and spawn the hub. `None` disables live reload.
fn start_hub(live: LiveOptions) -> Option<Hub> {
    let (tx, rx) = mpsc::channel::<HubMsg>(CHANNEL_BUFFER);
    match crate::reload::server::start_ws_server(live.interface, live.ws_port, tx.clone()) {
        Ok(port) => {
            crate::cli::serve::set_actual_ws_port(port);
            if port != live.ws_port {
                crate::log!("live"; "port {} in use, using {}", live.ws_port, port);
            }
        }
        Err(e) => {
            crate::log!("live"; "websocket server failed: {:#}", e);
            return None;
        }
    }
    tokio::spawn(WsActor::new(rx).run());
    Some(Hub {
        tx,
        serve_root: live.serve_root,
        asset_interval: live.asset_interval,
    })
}

/// Hub handle plus what is needed to canonicalize paths for it.
pub(crate) struct Hub {
    tx: mpsc::Sender<HubMsg>,
    serve_root: PathBuf,
    asset_interval: Duration,
}

/// Shared state for event handling.
pub(crate) struct Context {
    engine: Arc<RebuildEngine>,
    watcher: Arc<dyn Watcher>,
    poll_interval: Duration,
    hub: Option<Hub>,
}

impl Context {
    /// Subscribe every source and dependency target.
    fn subscribe_sources(&self) {
        let targets = self.engine.watch_targets();
        let mut count = 0;
        for path in &targets {
            if self.subscribe(path, WatchTag::Source) {
                count += 1;
            }
        }
        crate::log!("watch"; "watching {} files", count);
    }

    /// Subscribe every html/css/js file under the serve root.
    fn subscribe_assets(&self) {
        let Some(hub) = &self.hub else {
            return;
        };
        let extensions = extension_set(ASSET_EXTENSIONS);
        match scan_paths(&hub.serve_root, ScanOptions::new(true), &extensions) {
            Ok(assets) => {
                for path in &assets {
                    if let Err(e) = self.watcher.watch(path, hub.asset_interval, WatchTag::Asset) {
                        crate::debug!("watch"; "{:#}", anyhow::Error::from(e));
                    }
                }
                crate::debug!("live"; "watching {} assets", assets.len());
            }
            Err(e) => crate::log!("live"; "asset scan failed: {:#}", anyhow::Error::from(e)),
        }
    }

    /// Returns `true` when newly subscribed.
    fn subscribe(&self, path: &std::path::Path, tag: WatchTag) -> bool {
        match self.watcher.watch(path, self.poll_interval, tag) {
            Ok(added) => added,
            Err(e) => {
                crate::log!("watch"; "{:#}", anyhow::Error::from(e));
                false
            }
        }
    }
}
