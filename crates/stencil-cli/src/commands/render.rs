//! `stencil render`: compose, compile and render a template with data.

use std::{
    fs,
    io::{self, Read},
    path::Path,
};

use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::{
    cli::{GlobalArgs, RenderArgs},
    commands::{not_found, open_cache, parse_id},
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

#[instrument(skip_all, fields(template = %args.template))]
pub fn execute(
    args: RenderArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let id = parse_id(&args.template)?;
    let data = build_data(args.data.as_deref(), &args.vars)?;
    let cache = open_cache(&global, &config)?;

    if cache
        .get(&id)
        .with_cli_context(|| format!("compiling '{id}'"))?
        .is_none()
    {
        return Err(not_found(&cache, &id));
    }
    let rendered = cache
        .render_file(&id, &data)
        .with_cli_context(|| format!("rendering '{id}'"))?;
    cache.close()?;

    match args.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_cli_context(|| format!("creating {}", parent.display()))?;
            }
            fs::write(&path, &rendered)
                .with_cli_context(|| format!("writing {}", path.display()))?;
            output.success(&format!("Rendered {id} → {}", path.display()))?;
        }
        None => output.emit(&rendered)?,
    }
    Ok(())
}

/// Render data: the `--data` document (or `{}`), then each `--var`.
fn build_data(file: Option<&Path>, vars: &[String]) -> CliResult<Value> {
    let mut data = match file {
        Some(path) => read_data(path)?,
        None => Value::Object(Map::new()),
    };

    for var in vars {
        let (key, raw) = var.split_once('=').ok_or_else(|| CliError::InvalidInput {
            message: format!("'{var}' is not KEY=VALUE"),
            source: None,
        })?;
        if key.is_empty() || key.split('.').any(str::is_empty) {
            return Err(CliError::InvalidInput {
                message: format!("'{key}' is not a valid key"),
                source: None,
            });
        }
        set_path(&mut data, key, parse_value(raw))?;
    }
    debug!(vars = vars.len(), "Render data ready");
    Ok(data)
}

fn read_data(path: &Path) -> CliResult<Value> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .with_cli_context(|| "reading data from stdin")?;
        buf
    } else {
        fs::read_to_string(path).with_cli_context(|| format!("reading {}", path.display()))?
    };

    serde_json::from_str(&text).map_err(|e| CliError::InvalidData {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// JSON literals (`3`, `true`, `[1,2]`) keep their type; anything else is
/// a string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Set `a.b.c` in `data`, creating (or replacing non-object) parents.
fn set_path(data: &mut Value, key: &str, value: Value) -> CliResult<()> {
    let Value::Object(root) = data else {
        return Err(CliError::InvalidInput {
            message: "--var needs the --data document to be a JSON object".into(),
            source: None,
        });
    };

    let mut parts: Vec<&str> = key.split('.').collect();
    let last = parts.pop().unwrap_or(key);
    let mut current = root;
    for part in parts {
        let slot = current
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        current = slot.as_object_mut().ok_or_else(|| CliError::InvalidInput {
            message: format!("cannot set '{key}'"),
            source: None,
        })?;
    }
    current.insert(last.to_string(), value);
    Ok(())
}
