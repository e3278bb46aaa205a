//! Layout composition: splice a child template into its declared layout.
//!
//! ```text
//! child                                   layout (base.html)
//! ┌──────────────────────────────┐        ┌─────────────────────────────────┐
//! │ {{layout 'base'}}            │        │ <title>                         │
//! │ {{section 'title'}}Home      │ ─────▶ │   {{renderSection 'title'}}     │
//! │ {{/section}}                 │        │ </title>                        │
//! │ <p>Body</p>                  │ ─────▶ │ {{renderBody}}                  │
//! └──────────────────────────────┘        └─────────────────────────────────┘
//! ```
//!
//! Composition is a single pass: the loaded layout is never scanned for a
//! further `layout` tag.

use std::path::Path;

use regex::{Captures, NoExpand};
use tracing::{debug, warn};

use super::{
    DomainError, PathResolver, TagGrammar, TemplateId,
    sections::{extract_section, strip_sections},
};

/// Outcome of scanning a child for layout declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutDeclaration {
    None,
    Single(String),
    /// Two or more declarations; composition is skipped.
    Multiple(usize),
}

/// Combines child templates with their layouts.
#[derive(Debug, Clone)]
pub struct LayoutCompositor {
    grammar: TagGrammar,
    resolver: PathResolver,
}

impl LayoutCompositor {
    pub fn new(grammar: TagGrammar, resolver: PathResolver) -> Self {
        Self { grammar, resolver }
    }

    pub fn grammar(&self) -> &TagGrammar {
        &self.grammar
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    pub fn declaration(&self, source: &str) -> LayoutDeclaration {
        let mut names = self
            .grammar
            .layout()
            .captures_iter(source)
            .map(|caps| caps[1].to_string());
        match (names.next(), names.count()) {
            (None, _) => LayoutDeclaration::None,
            (Some(name), 0) => LayoutDeclaration::Single(name),
            (Some(_), rest) => LayoutDeclaration::Multiple(rest + 1),
        }
    }

    /// Compose `source` (the text of `child`) with its layout.
    ///
    /// `load_layout` reads the layout file at the resolved path; its errors
    /// propagate unchanged. A child without a layout tag, or with more than
    /// one, comes back as-is.
    pub fn compose<F, E>(
        &self,
        source: &str,
        child: &TemplateId,
        load_layout: F,
    ) -> Result<String, E>
    where
        F: FnOnce(&Path) -> Result<String, E>,
        E: From<DomainError>,
    {
        let layout_name = match self.declaration(source) {
            LayoutDeclaration::None => return Ok(source.to_string()),
            LayoutDeclaration::Multiple(count) => {
                warn!(
                    template = %child,
                    declarations = count,
                    "Multiple layout declarations; compiling template without a layout"
                );
                return Ok(source.to_string());
            }
            LayoutDeclaration::Single(name) => name,
        };

        let child_text = self.grammar.layout().replace_all(source, "");
        let layout_path = self.resolver.resolve_layout(child, &layout_name)?;
        debug!(template = %child, layout = %layout_path.display(), "Loading layout");
        let layout = load_layout(&layout_path)?;

        Ok(self.splice(&layout, &child_text))
    }

    /// Fill `layout`'s placeholders from `child_text` (layout tag already
    /// removed).
    pub fn splice(&self, layout: &str, child_text: &str) -> String {
        let with_sections = self
            .grammar
            .render_section()
            .replace_all(layout, |caps: &Captures<'_>| {
                extract_section(&self.grammar, child_text, &caps[1]).unwrap_or_default()
            });

        let body = strip_sections(&self.grammar, child_text);
        self.grammar
            .render_body()
            .replace(&with_sections, NoExpand(body.as_ref()))
            .into_owned()
    }
}
