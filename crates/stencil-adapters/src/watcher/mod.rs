//! File watcher adapters.

mod manual;
mod native;

pub use manual::ManualWatcher;
pub use native::NotifyWatcher;
