//! Platform file watcher backed by `notify`.
//!
//! Handles:
//! - Content modification (`Changed`)
//! - Deletion (`Removed`)
//! - Moves away from the watched path (`Renamed`)
//! - Re-creation at the watched path (treated as `Changed`)

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use notify::{
    Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
    event::{ModifyKind, RenameMode},
};
use stencil_core::{
    application::{
        ApplicationError,
        ports::{FileWatcher, WatchCallback, WatchEvent, WatchHandle},
    },
    error::StencilResult,
};
use tracing::{debug, warn};

/// One `notify` watcher per watched file, non-recursive.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotifyWatcher;

impl NotifyWatcher {
    pub fn new() -> Self {
        Self
    }
}

/// Keeps the underlying watcher alive; dropping it stops delivery.
struct NotifyHandle {
    path: PathBuf,
    _watcher: Mutex<RecommendedWatcher>,
}

impl WatchHandle for NotifyHandle {
    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for NotifyHandle {
    fn drop(&mut self) {
        debug!(path = %self.path.display(), "Watch released");
    }
}

impl FileWatcher for NotifyWatcher {
    fn watch(&self, path: &Path, on_event: WatchCallback) -> StencilResult<Box<dyn WatchHandle>> {
        let watched = path.to_path_buf();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    for mapped in translate(&event) {
                        on_event(mapped);
                    }
                }
                Err(e) => warn!(path = %watched.display(), "File watcher error: {}", e),
            }
        })
        .map_err(|e| watch_failed(path, e))?;

        watcher
            .watch(path, RecursiveMode::NonRecursive)
            .map_err(|e| watch_failed(path, e))?;
        debug!(path = %path.display(), "Now watching file");

        Ok(Box::new(NotifyHandle {
            path: path.to_path_buf(),
            _watcher: Mutex::new(watcher),
        }))
    }
}

/// Map a raw `notify` event onto the cache's event kinds.
fn translate(event: &Event) -> Vec<WatchEvent> {
    match event.kind {
        EventKind::Create(_) => vec![WatchEvent::Changed],
        EventKind::Modify(ModifyKind::Data(_))
        | EventKind::Modify(ModifyKind::Any)
        | EventKind::Modify(ModifyKind::Other) => vec![WatchEvent::Changed],
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            // Something else was moved onto the watched path.
            RenameMode::To => vec![WatchEvent::Changed],
            _ => vec![WatchEvent::Renamed],
        },
        EventKind::Remove(_) => vec![WatchEvent::Removed],
        EventKind::Modify(ModifyKind::Metadata(_)) | EventKind::Access(_) | EventKind::Any
        | EventKind::Other => Vec::new(),
    }
}

fn watch_failed(path: &Path, e: notify::Error) -> stencil_core::error::StencilError {
    ApplicationError::WatchFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
    .into()
}
