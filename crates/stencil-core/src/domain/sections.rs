//! Section extraction from child templates.
//!
//! A section body ends at the first close tag after its open tag, so a
//! body cannot itself contain `{{/section}}`. Nested sections are not
//! supported.

use std::borrow::Cow;

use super::TagGrammar;

/// A named block defined in a child template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub body: String,
}

/// Flattened inner text of the first section named `name`, or `None`.
///
/// Every `\r` and `\n` is removed: placeholders usually sit inline in the
/// layout's markup.
pub fn extract_section(grammar: &TagGrammar, source: &str, name: &str) -> Option<String> {
    let block = grammar.section_block(name)?;
    let caps = block.captures(source)?;
    Some(flatten(caps.get(2).map_or("", |m| m.as_str())))
}

/// All section blocks in textual order, bodies unmodified.
pub fn sections(grammar: &TagGrammar, source: &str) -> Vec<Section> {
    grammar
        .any_section()
        .captures_iter(source)
        .map(|caps| Section {
            name: caps[1].to_string(),
            body: caps[2].to_string(),
        })
        .collect()
}

/// `source` with every section block (wrapper tags and body) removed.
pub fn strip_sections<'a>(grammar: &TagGrammar, source: &'a str) -> Cow<'a, str> {
    grammar.any_section().replace_all(source, "")
}

fn flatten(body: &str) -> String {
    body.chars().filter(|c| !matches!(c, '\r' | '\n')).collect()
}
