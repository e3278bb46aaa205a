//! Infrastructure adapters for Stencil.
//!
//! This crate implements the ports defined in `stencil_core::application::ports`.
//! It contains all external dependencies and I/O operations.

pub mod compiler;
pub mod filesystem;
pub mod watcher;

// Re-export commonly used adapters
pub use compiler::SimpleCompiler;
pub use filesystem::{LocalFilesystem, MemoryFilesystem};
pub use watcher::{ManualWatcher, NotifyWatcher};
