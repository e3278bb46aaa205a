// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for Stencil.
//!
//! Pure text and path logic: tag grammar, section extraction, layout
//! composition and path confinement. Nothing here reads a file or owns a
//! cache; layout loading is passed in by the application layer.
//!
//! ## Hexagonal Architecture Compliance
//!
//! - **No async**: Domain logic is synchronous
//! - **No I/O**: Layout text arrives through a loader closure
//! - **Few external crates**: std + thiserror + regex (+ tracing events)
//!
// Public API - what the world sees
pub mod compositor;
pub mod error;
pub mod grammar;
pub mod path_resolver;
pub mod sections;
pub mod value_objects;

// Re-exports for convenience
pub use compositor::{LayoutCompositor, LayoutDeclaration};
pub use error::{DomainError, ErrorCategory};
pub use grammar::{TagGrammar, is_section_name};
pub use path_resolver::{LAYOUT_EXTENSION, PathResolver, include_identifier};
pub use sections::{Section, extract_section, sections, strip_sections};
pub use value_objects::{EngineOptions, FileEncoding, TagDelimiters, TemplateId};
