//! Application layer errors.
//!
//! These errors represent failures in orchestration (I/O through ports,
//! compilation, cache bookkeeping), not text or path rules. Those are
//! `DomainError` from `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors that occur while loading, compiling, caching, or rendering.
#[derive(Debug, Error, Clone)]
pub enum ApplicationError {
    /// No readable template exists for the identifier.
    #[error("Template not found: {id}")]
    TemplateNotFound { id: String },

    /// A declared layout could not be read.
    #[error("Layout {path} could not be read: {reason}")]
    LayoutUnavailable { path: PathBuf, reason: String },

    /// Filesystem operation failed.
    #[error("Filesystem error at {path}: {reason}")]
    FilesystemError { path: PathBuf, reason: String },

    /// The compiler rejected the composed source.
    #[error("Failed to compile '{template}': {reason}")]
    CompileFailed { template: String, reason: String },

    /// A compiled template failed while rendering.
    #[error("Failed to render '{template}': {reason}")]
    RenderFailed { template: String, reason: String },

    /// A file watch could not be registered.
    #[error("Failed to watch {path}: {reason}")]
    WatchFailed { path: PathBuf, reason: String },

    /// Includes nested deeper than the limit (usually an include cycle).
    #[error("Include depth {depth} exceeded while including '{template}'")]
    IncludeDepthExceeded { template: String, depth: usize },

    /// Cache access failed (lock poisoned).
    #[error("Compile cache lock poisoned")]
    CacheLockError,
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::TemplateNotFound { id } => vec![
                format!("No readable file for template '{}'", id),
                "Check templates.base_dir and templates.extension".into(),
            ],
            Self::LayoutUnavailable { path, .. } => vec![
                format!("Create the layout file {}", path.display()),
                "Layout paths are relative to the declaring template's directory".into(),
                "Layout files always use the .html suffix".into(),
            ],
            Self::FilesystemError { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that the file exists and is readable".into(),
            ],
            Self::IncludeDepthExceeded { .. } => vec![
                "Check for templates that include each other".into(),
            ],
            Self::WatchFailed { .. } => vec![
                "The platform file watcher refused the path".into(),
                "On Linux, check fs.inotify.max_user_watches".into(),
            ],
            Self::CacheLockError => vec![
                "A previous compile panicked while holding the cache".into(),
                "Restart the process".into(),
            ],
            _ => vec!["Check the error details above".into()],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::TemplateNotFound { .. } | Self::LayoutUnavailable { .. } => {
                ErrorCategory::NotFound
            }
            Self::CompileFailed { .. }
            | Self::RenderFailed { .. }
            | Self::IncludeDepthExceeded { .. } => ErrorCategory::Validation,
            Self::FilesystemError { .. } | Self::WatchFailed { .. } | Self::CacheLockError => {
                ErrorCategory::Internal
            }
        }
    }
}
