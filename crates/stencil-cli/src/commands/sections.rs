//! `stencil sections`: list the layout and sections a template declares.

use serde_json::json;
use stencil_core::domain::{LayoutDeclaration, sections};
use tracing::instrument;

use crate::{
    cli::{GlobalArgs, OutputFormat, TemplateArgs},
    commands::{not_found, open_cache, parse_id},
    config::AppConfig,
    error::{CliResult, IntoCli},
    output::OutputManager,
};

#[instrument(skip_all, fields(template = %args.template))]
pub fn execute(
    args: TemplateArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let id = parse_id(&args.template)?;
    let cache = open_cache(&global, &config)?;

    let source = cache
        .source(&id)
        .with_cli_context(|| format!("reading '{id}'"))?
        .ok_or_else(|| not_found(&cache, &id))?;

    let compositor = cache.compositor();
    let declaration = compositor.declaration(&source);
    let found = sections(compositor.grammar(), &source);

    if output.format() == OutputFormat::Json {
        let layout = match &declaration {
            LayoutDeclaration::Single(path) => json!(path),
            LayoutDeclaration::None | LayoutDeclaration::Multiple(_) => json!(null),
        };
        let sections: Vec<_> = found
            .iter()
            .map(|s| json!({ "name": s.name, "body": s.body }))
            .collect();
        output.json(&json!({
            "template": id.as_str(),
            "layout": layout,
            "sections": sections,
        }))?;
        return Ok(());
    }

    match &declaration {
        LayoutDeclaration::None => output.info("No layout")?,
        LayoutDeclaration::Single(path) => output.header(&format!("Layout: {path}"))?,
        LayoutDeclaration::Multiple(count) => {
            output.warning(&format!("{count} layout declarations; layout is ignored"))?
        }
    }
    if found.is_empty() {
        output.info("No sections")?;
    }
    for section in &found {
        output.print(&format!("{}: {}", section.name, section.body))?;
    }
    Ok(())
}
