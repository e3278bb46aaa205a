//! Application services - orchestrate use cases.
//!
//! `CompileCache` turns a template identifier into a cached, watched,
//! layout-composed render function.

pub mod compile_cache;

pub use compile_cache::{CompileCache, MAX_INCLUDE_DEPTH};
