//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `stencil-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `Filesystem`: File reads
//!   - `FileWatcher`: Change notification
//!   - `TemplateCompiler`: Composed source → render function
//!
//! - **Driving (Input) Ports**: Called by external world, implemented by application
//!   - (`CompileCache` is used directly by the CLI)

pub mod output;

pub use output::{
    CompileOptions, FileWatcher, Filesystem, IncludeResolver, Render, RenderFunction,
    TemplateCompiler, WatchCallback, WatchEvent, WatchHandle,
};

#[cfg(test)]
pub use output::{MockFileWatcher, MockFilesystem, MockTemplateCompiler};
