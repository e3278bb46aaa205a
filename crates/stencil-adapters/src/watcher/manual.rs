//! Watcher driven by hand, for tests and hosts without native events.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex, Weak,
        atomic::{AtomicU64, Ordering},
    },
};

use stencil_core::{
    application::{
        ApplicationError,
        ports::{FileWatcher, WatchCallback, WatchEvent, WatchHandle},
    },
    error::StencilResult,
};

type Registry = Mutex<HashMap<u64, (PathBuf, WatchCallback)>>;

/// Records registrations and replays events on [`ManualWatcher::emit`].
#[derive(Clone, Default)]
pub struct ManualWatcher {
    registry: Arc<Registry>,
    next_id: Arc<AtomicU64>,
}

impl ManualWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to every live watch on `path`.
    ///
    /// Returns the number of callbacks invoked.
    pub fn emit(&self, path: impl AsRef<Path>, event: WatchEvent) -> usize {
        // Callbacks may drop handles, which takes the registry lock.
        let callbacks: Vec<WatchCallback> = match self.registry.lock() {
            Ok(registry) => registry
                .values()
                .filter(|(watched, _)| watched == path.as_ref())
                .map(|(_, cb)| cb.clone())
                .collect(),
            Err(_) => return 0,
        };
        for cb in &callbacks {
            cb(event);
        }
        callbacks.len()
    }

    /// Number of live watches.
    pub fn watch_count(&self) -> usize {
        self.registry.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_watching(&self, path: impl AsRef<Path>) -> bool {
        self.registry
            .lock()
            .map(|r| r.values().any(|(watched, _)| watched == path.as_ref()))
            .unwrap_or(false)
    }
}

struct ManualHandle {
    id: u64,
    path: PathBuf,
    registry: Weak<Registry>,
}

impl WatchHandle for ManualHandle {
    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ManualHandle {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            if let Ok(mut registry) = registry.lock() {
                registry.remove(&self.id);
            }
        }
    }
}

impl FileWatcher for ManualWatcher {
    fn watch(&self, path: &Path, on_event: WatchCallback) -> StencilResult<Box<dyn WatchHandle>> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.registry
            .lock()
            .map_err(|_| ApplicationError::WatchFailed {
                path: path.to_path_buf(),
                reason: "watch registry poisoned".into(),
            })?
            .insert(id, (path.to_path_buf(), on_event));

        Ok(Box::new(ManualHandle {
            id,
            path: path.to_path_buf(),
            registry: Arc::downgrade(&self.registry),
        }))
    }
}
