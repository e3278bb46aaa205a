//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value.  The
//! CLI layer owns config; the core crate only sees the [`EngineOptions`]
//! built from it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (`--base-dir`, `--no-color`; applied at the call-site)
//! 2. Environment variables (`STENCIL_TEMPLATES__BASE_DIR=...`)
//! 3. Config file (`--config FILE`, or the platform config dir)
//! 4. Built-in defaults (always present)

use std::path::{Path, PathBuf};

use anyhow::Context;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use stencil_core::domain::{EngineOptions, FileEncoding, TagDelimiters};

use crate::error::{CliError, CliResult};

/// Prefix for configuration environment variables.
pub const ENV_PREFIX: &str = "STENCIL";

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where templates live and how they are read.
    pub templates: TemplateConfig,
    /// Tag delimiters.
    pub tags: TagConfig,
    /// Output settings.
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    pub base_dir: PathBuf,
    pub extension: String,
    pub encoding: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagConfig {
    pub open: String,
    pub close: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub no_color: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            templates: TemplateConfig {
                base_dir: PathBuf::from("."),
                extension: EngineOptions::DEFAULT_EXTENSION.into(),
                encoding: FileEncoding::default().as_str().into(),
            },
            tags: TagConfig {
                open: TagDelimiters::DEFAULT_OPEN.into(),
                close: TagDelimiters::DEFAULT_CLOSE.into(),
            },
            output: OutputConfig { no_color: false },
        }
    }
}

impl AppConfig {
    /// Load configuration: defaults, then the TOML file, then `STENCIL_*`.
    ///
    /// An explicit `config_file` must exist; the default location is
    /// optional.
    pub fn load(config_file: Option<&PathBuf>) -> anyhow::Result<Self> {
        let defaults =
            Config::try_from(&Self::default()).context("Failed to build default configuration")?;

        let file = match config_file {
            Some(path) => File::from(path.as_path())
                .format(FileFormat::Toml)
                .required(true),
            None => File::from(Self::config_path())
                .format(FileFormat::Toml)
                .required(false),
        };

        Config::builder()
            .add_source(defaults)
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    /// Path to the default configuration file.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness,
    /// falling back to `.stencil.toml` in the current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("dev", "stencil", "stencil")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(".stencil.toml"))
    }

    /// Engine options for this configuration; `base_dir` overrides the
    /// configured template directory.
    pub fn engine_options(&self, base_dir: Option<&Path>) -> CliResult<EngineOptions> {
        let encoding: FileEncoding = self
            .templates
            .encoding
            .parse()
            .map_err(|e| config_error("templates.encoding", e))?;
        let delimiters = TagDelimiters::new(self.tags.open.clone(), self.tags.close.clone())
            .map_err(|e| config_error("tags", e))?;

        let options = EngineOptions::new(base_dir.unwrap_or(&self.templates.base_dir))
            .with_extension(self.templates.extension.clone())
            .with_encoding(encoding)
            .with_delimiters(delimiters);
        options
            .validate()
            .map_err(|e| config_error("templates.extension", e))?;
        Ok(options)
    }
}

fn config_error(key: &str, e: stencil_core::domain::DomainError) -> CliError {
    CliError::ConfigError {
        message: format!("{key}: {e}"),
        source: Some(Box::new(e)),
    }
}
