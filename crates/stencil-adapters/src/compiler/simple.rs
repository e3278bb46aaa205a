//! Simple variable substitution compiler.
//!
//! Understands two tag forms inside the configured delimiters:
//! - `{{ name }}` / `{{ a.b.0 }}`: value lookup, HTML-escaped, unknown → empty
//! - `{{ include 'path' }}`: rendered through the engine's include hook
//!
//! Anything else between delimiters is left as literal text.

use std::sync::Arc;

use regex::Regex;
use serde_json::Value;
use stencil_core::{
    application::{
        ApplicationError,
        ports::{CompileOptions, IncludeResolver, Render, RenderFunction, TemplateCompiler},
    },
    domain::{TagDelimiters, TemplateId},
    error::StencilResult,
};
use tracing::{instrument, trace};

/// Compiler for the built-in expression language.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleCompiler;

impl SimpleCompiler {
    /// Create a new simple compiler.
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Value(Vec<String>),
    Include(String),
}

struct Compiled {
    template: TemplateId,
    segments: Vec<Segment>,
}

impl TemplateCompiler for SimpleCompiler {
    #[instrument(skip_all, fields(template = %options.template))]
    fn compile(&self, source: &str, options: &CompileOptions) -> StencilResult<RenderFunction> {
        let pattern = expression_pattern(&options.delimiters).map_err(|e| {
            ApplicationError::CompileFailed {
                template: options.template.to_string(),
                reason: e.to_string(),
            }
        })?;
        let segments = parse(&pattern, source);
        trace!(segments = segments.len(), "Compiled template");

        Ok(Arc::new(Compiled {
            template: options.template.clone(),
            segments,
        }))
    }
}

impl Render for Compiled {
    fn render(&self, data: &Value, includes: &dyn IncludeResolver) -> StencilResult<String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Value(path) => {
                    if let Some(value) = lookup(data, path) {
                        escape_html_into(&mut out, &display(value));
                    }
                }
                Segment::Include(filename) => {
                    out.push_str(&includes.include(filename, data, &self.template)?);
                }
            }
        }
        Ok(out)
    }
}

fn expression_pattern(delimiters: &TagDelimiters) -> Result<Regex, regex::Error> {
    let open = regex::escape(delimiters.open());
    let close = regex::escape(delimiters.close());
    Regex::new(&format!(
        r#"{open}\s*(?:include\s+['"]([^'"]+)['"]|([A-Za-z_][A-Za-z0-9_\-]*(?:\.[A-Za-z0-9_\-]+)*))\s*{close}"#
    ))
}

fn parse(pattern: &Regex, source: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0;

    for caps in pattern.captures_iter(source) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            segments.push(Segment::Text(source[last..whole.start()].to_string()));
        }
        if let Some(filename) = caps.get(1) {
            segments.push(Segment::Include(filename.as_str().to_string()));
        } else if let Some(path) = caps.get(2) {
            segments.push(Segment::Value(
                path.as_str().split('.').map(str::to_string).collect(),
            ));
        }
        last = whole.end();
    }
    if last < source.len() {
        segments.push(Segment::Text(source[last..].to_string()));
    }
    segments
}

fn lookup<'a>(data: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter().try_fold(data, |current, key| match current {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn escape_html_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
}
