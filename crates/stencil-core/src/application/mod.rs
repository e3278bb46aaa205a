//! Application layer for Stencil.
//!
//! This layer contains:
//! - **Services**: The compile cache (load, compose, compile, watch)
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Errors**: Application-specific error types
//!
//! Text rules (tags, sections, path confinement) live in `crate::domain`;
//! this layer only sequences them around I/O.

pub mod error;
pub mod ports;
pub mod services;

pub use services::{CompileCache, MAX_INCLUDE_DEPTH};

// Re-export port traits (for adapter implementation)
pub use ports::{
    CompileOptions, FileWatcher, Filesystem, IncludeResolver, Render, RenderFunction,
    TemplateCompiler, WatchCallback, WatchEvent, WatchHandle,
};

pub use error::ApplicationError;
