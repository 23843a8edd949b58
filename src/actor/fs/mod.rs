//! File watching.
//!
//! Subscriptions are per file and tag: one path may feed both the cascade
//! and the hub. A [`Watcher`] sends one [`WatchEvent`] per subscribed tag
//! whenever the file's modification stamp changes.
//!
//! ```text
//! PollWatcher    one tokio task per file, fixed interval
//! NativeWatcher  notify on each parent directory, filtered by path
//! ```

mod native;
mod poll;


use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use super::messages::{WatchEvent, WatchTag};

pub use native::NativeWatcher;
pub use poll::PollWatcher;

/// Subscription setup failed.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("cannot watch `{0}`")]
    Notify(PathBuf, #[source] notify::Error),

    #[error("`{0}` has no parent directory to watch")]
    NoParent(PathBuf),
}

/// Per-file change subscriptions.
pub trait Watcher: Send + Sync {
    /// Subscribe to `path` under `tag`. Returns `false` if that pair was
    /// already subscribed.
    ///
    /// `interval` is a polling hint; event-driven backends ignore it.
    fn watch(&self, path: &Path, interval: Duration, tag: WatchTag) -> Result<bool, WatchError>;

    /// Drop the `tag` subscription for `path`. Returns `false` if there was none.
    fn unwatch(&self, path: &Path, tag: WatchTag) -> bool;

    fn is_watching(&self, path: &Path, tag: WatchTag) -> bool;
}

/// Watcher backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatcherKind {
    /// Stat each file on an interval
    #[default]
    Poll,
    /// OS notifications (inotify, FSEvents, ...)
    Native,
}

/// Create the configured backend. Must be called inside a tokio runtime.
pub fn create_watcher(
    kind: WatcherKind,
    tx: mpsc::Sender<WatchEvent>,
) -> Result<Arc<dyn Watcher>, WatchError> {
    Ok(match kind {
        WatcherKind::Poll => Arc::new(PollWatcher::new(tx)),
        WatcherKind::Native => Arc::new(NativeWatcher::new(tx)?),
    })
}
