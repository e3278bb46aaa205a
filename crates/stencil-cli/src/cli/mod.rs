//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "stencil",
    bin_name = "stencil",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Layout-aware template rendering",
    long_about = "Stencil merges templates into their declared layouts, \
                  compiles them once and renders them with JSON data.",
    after_help = "EXAMPLES:\n\
        \x20 stencil -d ./views render blog/post --data post.json\n\
        \x20 stencil render index --var title=Home --var user.name=Ada\n\
        \x20 stencil compose blog/post\n\
        \x20 stencil completions bash > /usr/share/bash-completion/completions/stencil",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compose, compile and render a template.
    #[command(
        visible_alias = "r",
        about = "Render a template with data",
        after_help = "EXAMPLES:\n\
            \x20 stencil render page\n\
            \x20 stencil render blog/post --data post.json -o out/post.html\n\
            \x20 stencil render page --var title=Home --var count=3"
    )]
    Render(RenderArgs),

    /// Print the layout-composed source without compiling it.
    #[command(
        about = "Show a template merged into its layout",
        after_help = "EXAMPLES:\n\
            \x20 stencil compose blog/post"
    )]
    Compose(TemplateArgs),

    /// List the sections a template defines.
    #[command(
        about = "List the sections defined by a template",
        after_help = "EXAMPLES:\n\
            \x20 stencil sections blog/post\n\
            \x20 stencil sections blog/post --output-format json"
    )]
    Sections(TemplateArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 stencil completions bash > ~/.local/share/bash-completion/completions/stencil\n\
            \x20 stencil completions zsh  > ~/.zfunc/_stencil\n\
            \x20 stencil completions fish > ~/.config/fish/completions/stencil.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the Stencil configuration.
    #[command(
        about = "Configuration inspection",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 stencil config get templates.extension\n\
            \x20 stencil config list\n\
            \x20 stencil config path"
    )]
    Config(ConfigCommands),
}

impl Commands {
    /// Subcommand name as typed, without aliases.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Render(_) => "render",
            Self::Compose(_) => "compose",
            Self::Sections(_) => "sections",
            Self::Completions(_) => "completions",
            Self::Config(_) => "config",
        }
    }
}

// ── render ────────────────────────────────────────────────────────────────────

/// Arguments for `stencil render`.
#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Template identifier, relative to the base directory, without extension.
    #[arg(value_name = "TEMPLATE", help = "Template identifier (e.g. blog/post)")]
    pub template: String,

    /// JSON file with the render data.
    #[arg(
        long = "data",
        value_name = "FILE",
        help = "JSON file with render data ('-' for stdin)"
    )]
    pub data: Option<PathBuf>,

    /// Individual values, applied on top of `--data`.
    #[arg(
        long = "var",
        value_name = "KEY=VALUE",
        help = "Set a value (dotted keys allowed); repeatable"
    )]
    pub vars: Vec<String>,

    /// Write the result to a file instead of stdout.
    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        help = "Output file (default: stdout)"
    )]
    pub output: Option<PathBuf>,
}

// ── compose / sections ────────────────────────────────────────────────────────

/// Arguments for commands that take a single template.
#[derive(Debug, Args)]
pub struct TemplateArgs {
    /// Template identifier, relative to the base directory, without extension.
    #[arg(value_name = "TEMPLATE", help = "Template identifier (e.g. blog/post)")]
    pub template: String,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `stencil completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `stencil config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `templates.extension`.
        key: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the default configuration file.
    Path,
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_render_command() {
        let cli = Cli::parse_from([
            "stencil", "render", "blog/post", "--var", "title=Hi", "--var", "n=2",
        ]);
        match cli.command {
            Commands::Render(args) => {
                assert_eq!(args.template, "blog/post");
                assert_eq!(args.vars, vec!["title=Hi", "n=2"]);
                assert!(args.data.is_none());
            }
            other => panic!("expected Render, got {other:?}"),
        }
    }

    #[test]
    fn render_alias() {
        let cli = Cli::parse_from(["stencil", "r", "page"]);
        assert!(matches!(cli.command, Commands::Render(_)));
    }

    #[test]
    fn base_dir_is_global() {
        let cli = Cli::parse_from(["stencil", "compose", "page", "--base-dir", "views"]);
        assert_eq!(cli.global.base_dir, Some(PathBuf::from("views")));
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        let result = Cli::try_parse_from(["stencil", "--quiet", "--verbose", "config", "list"]);
        assert!(result.is_err());
    }

    #[test]
    fn config_set_is_not_a_command() {
        let result = Cli::try_parse_from(["stencil", "config", "set", "a", "b"]);
        assert!(result.is_err());
    }
}
