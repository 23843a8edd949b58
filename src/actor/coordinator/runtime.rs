use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::Context;
use crate::actor::messages::{WatchEvent, WatchTag};

/// Dispatch watch events until shutdown.
pub(super) async fn run_loop(
    ctx: Arc<Context>,
    events: mpsc::Receiver<WatchEvent>,
    shutdown_rx: Option<Receiver<()>>,
) {
    let dispatch = tokio::spawn(dispatch(ctx, events));

    if let Some(rx) = shutdown_rx {
        loop {
            if rx.try_recv().is_ok() || crate::core::is_shutdown() {
                crate::debug!("actor"; "shutdown signal received");
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        dispatch.abort();
    } else {
        let _ = dispatch.await;
    }
}

/// Route each event: sources cascade on their own task, assets go to the hub.
pub(super) async fn dispatch(ctx: Arc<Context>, mut events: mpsc::Receiver<WatchEvent>) {
    while let Some(event) = events.recv().await {
        match event.tag {
            WatchTag::Source => {
                let ctx = Arc::clone(&ctx);
                tokio::spawn(async move { ctx.on_source_change(event.path).await });
            }
            WatchTag::Asset => ctx.on_asset_change(&event.path).await,
        }
    }
}
