//! Tag grammar: the scan patterns for layout inheritance, parameterized by
//! the configured delimiters.
//!
//! | Tag                                   | Pattern            |
//! |---------------------------------------|--------------------|
//! | `{{ layout 'base' }}`                 | [`TagGrammar::layout`] |
//! | `{{ section 'x' }} … {{ /section }}`  | [`TagGrammar::section_block`] |
//! | `{{ renderSection 'x' }}`             | [`TagGrammar::render_section`] |
//! | `{{ renderBody }}`                    | [`TagGrammar::render_body`] |
//!
//! Delimiters are escaped before they reach a pattern; the defaults are
//! regex metacharacters.

use regex::Regex;

use super::{DomainError, TagDelimiters};

/// Characters allowed in a layout path.
const LAYOUT_PATH: &str = r"[./\-_a-zA-Z0-9]+";
/// Characters allowed in a section name.
const SECTION_NAME: &str = r"[a-zA-Z0-9]+";

/// Compiled scan patterns for one delimiter pair.
#[derive(Debug, Clone)]
pub struct TagGrammar {
    delimiters: TagDelimiters,
    open: String,
    close: String,
    layout: Regex,
    any_section: Regex,
    render_section: Regex,
    render_body: Regex,
}

impl TagGrammar {
    pub fn new(delimiters: TagDelimiters) -> Result<Self, DomainError> {
        let open = regex::escape(delimiters.open());
        let close = regex::escape(delimiters.close());

        let layout = build(&format!(
            r#"{open}\s*layout\s*['"]({LAYOUT_PATH})['"]\s*{close}"#
        ))?;
        let any_section = build(&section_pattern(&open, &close, SECTION_NAME))?;
        let render_section = build(&format!(
            r#"{open}\s*renderSection\s*['"]({SECTION_NAME})['"]\s*{close}"#
        ))?;
        let render_body = build(&format!(r"{open}\s*renderBody\s*{close}"))?;

        Ok(Self {
            delimiters,
            open,
            close,
            layout,
            any_section,
            render_section,
            render_body,
        })
    }

    pub fn delimiters(&self) -> &TagDelimiters {
        &self.delimiters
    }

    /// `open layout 'path' close`; group 1 is the path.
    pub fn layout(&self) -> &Regex {
        &self.layout
    }

    /// Any section block; group 1 is the name, group 2 the body.
    pub fn any_section(&self) -> &Regex {
        &self.any_section
    }

    /// `open renderSection 'name' close`; group 1 is the name.
    pub fn render_section(&self) -> &Regex {
        &self.render_section
    }

    /// `open renderBody close`.
    pub fn render_body(&self) -> &Regex {
        &self.render_body
    }

    /// Block for one named section; group 1 is the name, group 2 the body
    /// (non-greedy, spans newlines).
    ///
    /// Returns `None` for names outside `[a-zA-Z0-9]+`.
    pub fn section_block(&self, name: &str) -> Option<Regex> {
        if !is_section_name(name) {
            return None;
        }
        // Cannot fail: every piece is escaped or a fixed pattern.
        Regex::new(&section_pattern(&self.open, &self.close, &regex::escape(name))).ok()
    }
}

impl Default for TagGrammar {
    fn default() -> Self {
        // The default delimiters always produce valid patterns.
        match Self::new(TagDelimiters::default()) {
            Ok(grammar) => grammar,
            Err(e) => unreachable!("default tag grammar failed to build: {e}"),
        }
    }
}

/// Whether `name` is usable as a section name.
pub fn is_section_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Group 1 is the name, group 2 the body.
fn section_pattern(open: &str, close: &str, name: &str) -> String {
    format!(r#"{open}\s*section\s*['"]({name})['"]\s*{close}(?s:(.*?)){open}\s*/section\s*{close}"#)
}

fn build(pattern: &str) -> Result<Regex, DomainError> {
    Regex::new(pattern).map_err(|e| DomainError::Pattern(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grammar() -> TagGrammar {
        TagGrammar::default()
    }

    #[test]
    fn layout_tag_variants() {
        let g = grammar();
        for tag in [
            "{{layout 'base'}}",
            "{{ layout 'base' }}",
            r#"{{layout "base"}}"#,
            "{{  layout   'base'}}",
        ] {
            let caps = g.layout().captures(tag).expect(tag);
            assert_eq!(&caps[1], "base");
        }
    }

    #[test]
    fn layout_path_charset() {
        let g = grammar();
        let caps = g.layout().captures("{{layout '../shared/base-v2_x'}}").unwrap();
        assert_eq!(&caps[1], "../shared/base-v2_x");
        assert!(g.layout().find("{{layout 'a b'}}").is_none());
        assert!(g.layout().find("{{layout 'a$b'}}").is_none());
    }

    #[test]
    fn render_section_captures_name() {
        let caps = grammar()
            .render_section()
            .captures("<title>{{renderSection 'title'}}</title>")
            .unwrap();
        assert_eq!(&caps[1], "title");
    }

    #[test]
    fn render_body_matches_with_spaces() {
        let g = grammar();
        assert!(g.render_body().is_match("{{renderBody}}"));
        assert!(g.render_body().is_match("{{ renderBody }}"));
        assert!(!g.render_body().is_match("{{renderBodyX}}"));
    }

    #[test]
    fn section_block_is_non_greedy_and_multiline() {
        let source = "{{section 'a'}}one\ntwo{{/section}} mid {{section 'a'}}three{{/section}}";
        let block = grammar().section_block("a").unwrap();
        let caps = block.captures(source).unwrap();
        assert_eq!(&caps[2], "one\ntwo");
    }

    #[test]
    fn section_block_rejects_bad_names() {
        let g = grammar();
        assert!(g.section_block("").is_none());
        assert!(g.section_block("a-b").is_none());
        assert!(g.section_block(".*").is_none());
    }

    #[test]
    fn custom_delimiters_are_literal() {
        let delimiters = TagDelimiters::new("<%", "%>").unwrap();
        let g = TagGrammar::new(delimiters).unwrap();
        assert!(g.render_body().is_match("<% renderBody %>"));
        assert!(!g.render_body().is_match("{{renderBody}}"));

        // Metacharacters must not act as pattern syntax.
        let g = TagGrammar::new(TagDelimiters::new("[(", ")]").unwrap()).unwrap();
        assert!(g.render_body().is_match("[(renderBody)]"));
        assert!(!g.render_body().is_match("(renderBody)"));
    }
}
