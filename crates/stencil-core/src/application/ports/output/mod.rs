//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `stencil-adapters` crate provides implementations.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use crate::domain::{TagDelimiters, TemplateId};
use crate::error::StencilResult;

/// Port for reading template and layout files.
///
/// Implemented by:
/// - `stencil_adapters::filesystem::LocalFilesystem` (production)
/// - `stencil_adapters::filesystem::MemoryFilesystem` (testing)
#[cfg_attr(test, mockall::automock)]
pub trait Filesystem: Send + Sync {
    /// Read the raw bytes of a file. Decoding is the caller's job.
    fn read(&self, path: &Path) -> StencilResult<Vec<u8>>;
}

/// What happened to a watched file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEvent {
    /// Content changed.
    Changed,
    /// File deleted.
    Removed,
    /// File moved away from the watched path.
    Renamed,
}

/// Called from the watcher's thread for every event on a watched path.
pub type WatchCallback = Arc<dyn Fn(WatchEvent) + Send + Sync>;

/// Registration of one watch. Dropping it stops delivery.
pub trait WatchHandle: Send + Sync {
    fn path(&self) -> &Path;
}

/// Port for file-change notification.
///
/// Implemented by:
/// - `stencil_adapters::watcher::NotifyWatcher` (production, via `notify`)
/// - `stencil_adapters::watcher::ManualWatcher` (testing)
#[cfg_attr(test, mockall::automock)]
pub trait FileWatcher: Send + Sync {
    fn watch(&self, path: &Path, on_event: WatchCallback) -> StencilResult<Box<dyn WatchHandle>>;
}

/// Options handed to the compiler with each composed source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Identifier the source was loaded for; include paths are relative to it.
    pub template: TemplateId,
    pub delimiters: TagDelimiters,
}

/// Callback a render function uses to pull in other templates.
pub trait IncludeResolver {
    /// Render `filename` (relative to `from`) with `data`.
    fn include(&self, filename: &str, data: &Value, from: &TemplateId) -> StencilResult<String>;
}

/// A compiled template.
pub trait Render: Send + Sync {
    fn render(&self, data: &Value, includes: &dyn IncludeResolver) -> StencilResult<String>;
}

/// Shared handle to a compiled template; swapped whole on recompilation.
pub type RenderFunction = Arc<dyn Render>;

/// Port for the underlying expression compiler (a black box to the engine).
///
/// Implemented by:
/// - `stencil_adapters::compiler::SimpleCompiler` (variable lookup + include)
#[cfg_attr(test, mockall::automock)]
pub trait TemplateCompiler: Send + Sync {
    fn compile(&self, source: &str, options: &CompileOptions) -> StencilResult<RenderFunction>;
}

impl fmt::Debug for dyn Render {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RenderFunction")
    }
}
