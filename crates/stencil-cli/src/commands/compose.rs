//! `stencil compose`: print a template merged into its layout.

use tracing::instrument;

use crate::{
    cli::{GlobalArgs, TemplateArgs},
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

    let composed = cache
        .compose(&id)
        .with_cli_context(|| format!("composing '{id}'"))?
        .ok_or_else(|| not_found(&cache, &id))?;

    output.emit(&composed)?;
    Ok(())
}
