//! Command handlers, one module per subcommand.

pub mod completions;
pub mod compose;
pub mod config;
pub mod render;
pub mod sections;

use std::sync::Arc;

use stencil_adapters::{LocalFilesystem, NotifyWatcher, SimpleCompiler};
use stencil_core::prelude::{CompileCache, TemplateId};
use tracing::debug;

use crate::{
    cli::GlobalArgs,
    config::AppConfig,
    error::{CliError, CliResult},
};

/// Compile cache over the local filesystem, as configured.
pub(crate) fn open_cache(global: &GlobalArgs, config: &AppConfig) -> CliResult<CompileCache> {
    let options = config.engine_options(global.base_dir.as_deref())?;
    debug!(
        base_dir = %options.base_dir.display(),
        extension = %options.extension,
        encoding = %options.encoding,
        delimiters = %options.delimiters,
        "Opening template directory"
    );

    Ok(CompileCache::new(
        options,
        Arc::new(LocalFilesystem::new()),
        Arc::new(SimpleCompiler::new()),
        Arc::new(NotifyWatcher::new()),
    )?)
}

pub(crate) fn parse_id(raw: &str) -> CliResult<TemplateId> {
    TemplateId::new(raw).map_err(|e| CliError::InvalidInput {
        message: format!("'{raw}' is not a template identifier"),
        source: Some(Box::new(e)),
    })
}

/// `TemplateNotFound` carrying the file the identifier resolved to.
pub(crate) fn not_found(cache: &CompileCache, id: &TemplateId) -> CliError {
    let path = cache
        .resolver()
        .resolve(id)
        .unwrap_or_else(|_| cache.resolver().base().to_path_buf());
    CliError::TemplateNotFound {
        id: id.to_string(),
        path,
    }
}
