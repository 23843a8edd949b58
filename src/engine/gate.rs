//! Per-file single flight for cascades.
//!
//! At most one cascade runs per file. While it runs, one more trigger may
//! wait its turn; further triggers are dropped because the waiting cascade
//! re-reads the file after it acquires the slot.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default)]
struct Slot {
    lock: Arc<Mutex<()>>,
    queued: AtomicBool,
}

/// Running/queued bookkeeping for every file that has cascaded.
#[derive(Default)]
pub struct CascadeGate {
    slots: DashMap<PathBuf, Arc<Slot>>,
}

impl CascadeGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the file's slot.
    ///
    /// Returns `None` when another trigger is already queued behind the
    /// running cascade; the caller should drop its event.
    pub async fn enter(&self, path: &Path) -> Option<OwnedMutexGuard<()>> {
        // Clone out of the map so no shard lock is held across the await
        let slot = self
            .slots
            .entry(path.to_path_buf())
            .or_default()
            .value()
            .clone();

        if let Ok(guard) = Arc::clone(&slot.lock).try_lock_owned() {
            return Some(guard);
        }
        if slot.queued.swap(true, Ordering::AcqRel) {
            return None;
        }

        let guard = Arc::clone(&slot.lock).lock_owned().await;
        slot.queued.store(false, Ordering::Release);
        Some(guard)
    }

}
