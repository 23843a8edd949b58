//! notify-based backend.
//!
//! notify watches directories; each subscribed file's parent is watched
//! non-recursively and events are filtered down to subscribed paths.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher as _};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::mpsc;

use super::{WatchError, Watcher};
use crate::actor::messages::{WatchEvent, WatchTag};

pub struct NativeWatcher {
    /// Must be kept alive for events to flow
    inner: Mutex<RecommendedWatcher>,
    /// Subscribed file → tags, in subscription order
    files: Arc<DashMap<PathBuf, Vec<WatchTag>>>,
    /// Watched directory → number of subscribed files in it
    dirs: Mutex<FxHashMap<PathBuf, usize>>,
}

impl NativeWatcher {
    pub fn new(tx: mpsc::Sender<WatchEvent>) -> Result<Self, WatchError> {
        let files: Arc<DashMap<PathBuf, Vec<WatchTag>>> = Arc::new(DashMap::new());
        let subscribed = Arc::clone(&files);

        // Runs on notify's own thread
        let watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    crate::log!("watch"; "notify error: {}", e);
                    return;
                }
            };
            if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                return;
            }
            for path in event.paths {
                let Some(tags) = subscribed.get(&path).map(|t| t.clone()) else {
                    continue;
                };
                for tag in tags {
                    let event = WatchEvent {
                        path: path.clone(),
                        tag,
                    };
                    if tx.blocking_send(event).is_err() {
                        return;
                    }
                }
            }
        })
        .map_err(|e| WatchError::Notify(PathBuf::new(), e))?;

        Ok(Self {
            inner: Mutex::new(watcher),
            files,
            dirs: Mutex::new(FxHashMap::default()),
        })
    }
}

impl Watcher for NativeWatcher {
    fn watch(&self, path: &Path, _interval: Duration, tag: WatchTag) -> Result<bool, WatchError> {
        // Guards `files` and `dirs` together
        let mut dirs = self.dirs.lock();
        if let Some(mut tags) = self.files.get_mut(path) {
            if tags.contains(&tag) {
                return Ok(false);
            }
            tags.push(tag);
            return Ok(true);
        }
        let dir = path
            .parent()
            .ok_or_else(|| WatchError::NoParent(path.to_path_buf()))?
            .to_path_buf();

        let count = dirs.entry(dir.clone()).or_insert(0);
        if *count == 0 {
            self.inner
                .lock()
                .watch(&dir, RecursiveMode::NonRecursive)
                .map_err(|e| WatchError::Notify(dir.clone(), e))?;
        }
        *count += 1;
        self.files.insert(path.to_path_buf(), vec![tag]);
        Ok(true)
    }

    fn unwatch(&self, path: &Path, tag: WatchTag) -> bool {
        let mut dirs = self.dirs.lock();
        let emptied = match self.files.get_mut(path) {
            Some(mut tags) => {
                let before = tags.len();
                tags.retain(|t| *t != tag);
                if tags.len() == before {
                    return false;
                }
                tags.is_empty()
            }
            None => return false,
        };
        if !emptied {
            return true;
        }
        self.files.remove(path);
        let Some(dir) = path.parent() else {
            return true;
        };
        if let Some(count) = dirs.get_mut(dir) {
            *count -= 1;
            if *count == 0 {
                dirs.remove(dir);
                let _ = self.inner.lock().unwatch(dir);
            }
        }
        true
    }

    fn is_watching(&self, path: &Path, tag: WatchTag) -> bool {
        self.files
            .get(path)
            .is_some_and(|tags| tags.contains(&tag))
    }
}
