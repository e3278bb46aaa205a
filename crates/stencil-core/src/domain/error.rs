// ============================================================================
// domain/error.rs - DOMAIN ERRORS
// ============================================================================

use std::path::PathBuf;
use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (they travel through the cache and watch callbacks)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Security
    // ========================================================================
    #[error("'{}' is not in the template directory '{}'", path.display(), base.display())]
    PathEscape { path: PathBuf, base: PathBuf },

    // ========================================================================
    // Validation Errors
    // ========================================================================
    #[error("Invalid template identifier '{0}'")]
    InvalidIdentifier(String),

    #[error("Invalid tag delimiters: {reason}")]
    InvalidDelimiters { reason: String },

    #[error("Invalid file extension '{0}'")]
    InvalidExtension(String),

    #[error("Unsupported file encoding '{0}'")]
    UnsupportedEncoding(String),

    #[error("File {} is not valid {encoding}", path.display())]
    Decode { path: PathBuf, encoding: &'static str },

    #[error("Tag pattern failed to build: {0}")]
    Pattern(String),
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::PathEscape { base, .. } => vec![
                "Template identifiers may not climb out of the template directory".into(),
                format!("Keep every template under {}", base.display()),
                "Remove '..' segments from the identifier or layout path".into(),
            ],
            Self::InvalidDelimiters { .. } => vec![
                "Both the open and close tag must be non-empty".into(),
                "Defaults are '{{' and '}}'".into(),
            ],
            Self::InvalidExtension(ext) => vec![
                format!("Extensions must start with '.', got '{}'", ext),
                "Example: .html".into(),
            ],
            Self::UnsupportedEncoding(_) => vec![
                "Supported encodings: utf-8, latin1".into(),
            ],
            Self::Decode { path, encoding } => vec![
                format!("Re-save {} as {}", path.display(), encoding),
                "Or change templates.encoding in the configuration".into(),
            ],
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::PathEscape { .. } => ErrorCategory::Security,
            Self::InvalidIdentifier(_) | Self::Decode { .. } => ErrorCategory::Validation,
            Self::InvalidDelimiters { .. }
            | Self::InvalidExtension(_)
            | Self::UnsupportedEncoding(_) => ErrorCategory::Configuration,
            Self::Pattern(_) => ErrorCategory::Internal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Security,
    Configuration,
    Internal,
}
