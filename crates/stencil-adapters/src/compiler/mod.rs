//! Template compiler adapters.

mod simple;

pub use simple::SimpleCompiler;
