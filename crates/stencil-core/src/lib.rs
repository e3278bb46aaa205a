//! Stencil Core - Hexagonal Architecture Implementation
//!
//! Layout-aware template loading for a string-template compiler: resolve an
//! identifier below a base directory, merge it into its declared layout,
//! compile the result once and keep it fresh while the file changes.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           stencil-cli (CLI)             │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │             (CompileCache)              │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │        Application Ports (Traits)       │
//! │  (Filesystem, FileWatcher, Compiler)    │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │    stencil-adapters (Infrastructure)    │
//! │ (LocalFilesystem, NotifyWatcher, etc)   │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Logic)       │
//! │ (TagGrammar, LayoutCompositor, Paths)   │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stencil_core::prelude::*;
//!
//! // Adapters come from `stencil-adapters`.
//! let cache = CompileCache::new(
//!     EngineOptions::new("./templates"),
//!     Arc::new(filesystem),
//!     Arc::new(compiler),
//!     Arc::new(watcher),
//! )?;
//!
//! let id = TemplateId::new("blog/post")?;
//! let html = cache.render_file(&id, &serde_json::json!({ "title": "Hi" }))?;
//! cache.close()?;
//! ```

pub mod domain;

pub mod application;

pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        CompileCache,
        ports::{
            CompileOptions, FileWatcher, Filesystem, IncludeResolver, Render, RenderFunction,
            TemplateCompiler, WatchCallback, WatchEvent, WatchHandle,
        },
    };
    pub use crate::domain::{
        EngineOptions, FileEncoding, LayoutCompositor, PathResolver, TagDelimiters, TagGrammar,
        TemplateId,
    };
    pub use crate::error::{StencilError, StencilResult};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
