//! Interval polling backend.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::{WatchError, Watcher};
use crate::actor::messages::{WatchEvent, WatchTag};

/// What a poll compares: modification time plus length, `None` when missing.
type Stamp = Option<(SystemTime, u64)>;

/// One polling task per subscribed file and tag.
pub struct PollWatcher {
    tx: mpsc::Sender<WatchEvent>,
    tasks: DashMap<(PathBuf, WatchTag), JoinHandle<()>>,
}

impl PollWatcher {
    pub fn new(tx: mpsc::Sender<WatchEvent>) -> Self {
        Self {
            tx,
            tasks: DashMap::new(),
        }
    }
}

impl Watcher for PollWatcher {
    fn watch(&self, path: &Path, interval: Duration, tag: WatchTag) -> Result<bool, WatchError> {
        let key = (path.to_path_buf(), tag);
        if self.tasks.contains_key(&key) {
            return Ok(false);
        }
        let handle = tokio::spawn(poll(path.to_path_buf(), interval, tag, self.tx.clone()));
        match self.tasks.entry(key) {
            Entry::Occupied(_) => {
                // Lost a race with another subscriber
                handle.abort();
                Ok(false)
            }
            Entry::Vacant(slot) => {
                slot.insert(handle);
                Ok(true)
            }
        }
    }

    fn unwatch(&self, path: &Path, tag: WatchTag) -> bool {
        match self.tasks.remove(&(path.to_path_buf(), tag)) {
            Some((_, handle)) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    fn is_watching(&self, path: &Path, tag: WatchTag) -> bool {
        self.tasks.contains_key(&(path.to_path_buf(), tag))
    }
}

impl Drop for PollWatcher {
    fn drop(&mut self) {
        for entry in self.tasks.iter() {
            entry.value().abort();
        }
    }
}

async fn stamp(path: &Path) -> Stamp {
    let meta = tokio::fs::metadata(path).await.ok()?;
    Some((meta.modified().ok()?, meta.len()))
}

/// Fire when the stamp changes to a present file. Deletion alone does not
/// fire; re-creation does.
async fn poll(path: PathBuf, interval: Duration, tag: WatchTag, tx: mpsc::Sender<WatchEvent>) {
    let mut last = stamp(&path).await;
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let current = stamp(&path).await;
        if current == last {
            continue;
        }
        last = current;
        if current.is_none() {
            continue;
        }
        let event = WatchEvent {
            path: path.clone(),
            tag,
        };
        if tx.send(event).await.is_err() {
            break;
        }
    }
}
