//! `stencil`: render layout-aware HTML templates from the command line.
//!
//! Every invocation builds one compile cache over the template directory,
//! runs a single command against it and releases its file watches on exit.
//!
//! Exit status:
//!
//! | Code | When                                                   |
//! |------|--------------------------------------------------------|
//! |  0   | the command succeeded (also `--help` / `--version`)    |
//! |  1   | an internal or I/O failure                             |
//! |  2   | bad arguments, bad render data, or a path escape       |
//! |  3   | the template or its layout does not exist              |
//! |  4   | the configuration file or `STENCIL_*` values are wrong |

use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, instrument};

use crate::{
    cli::{Cli, Commands},
    config::AppConfig,
    error::{CliError, CliResult},
    logging::init_logging,
    output::OutputManager,
};

mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod output;

fn main() -> ExitCode {
    // `STENCIL_*` overrides may come from a `.env` beside the templates.
    let _ = dotenvy::dotenv();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version go to stdout with status 0; usage errors to
            // stderr with status 2.
            let _ = e.print();
            return ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(2));
        }
    };

    if let Err(e) = init_logging(&cli.global) {
        eprintln!("stencil: {e}");
        return ExitCode::from(1);
    }

    let verbose = cli.global.verbose > 0;
    let config = match AppConfig::load(cli.global.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            let err = CliError::ConfigError {
                message: format!("{e:#}"),
                source: None,
            };
            return report(err, verbose, !cli.global.no_color);
        }
    };

    let output = OutputManager::new(&cli.global, &config);
    let color = output.supports_color();
    match run(cli, config, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(e, verbose, color),
    }
}

#[instrument(skip_all, fields(command = cli.command.name()))]
fn run(cli: Cli, config: AppConfig, output: OutputManager) -> CliResult<()> {
    debug!(
        base_dir = ?cli.global.base_dir,
        format = ?output.format(),
        "Dispatching"
    );
    match cli.command {
        Commands::Render(cmd) => commands::render::execute(cmd, cli.global, config, output),
        Commands::Compose(cmd) => commands::compose::execute(cmd, cli.global, config, output),
        Commands::Sections(cmd) => commands::sections::execute(cmd, cli.global, config, output),
        Commands::Completions(cmd) => commands::completions::execute(cmd),
        Commands::Config(cmd) => commands::config::execute(cmd, config, output),
    }
}

/// Log `err`, describe it on stderr and pick the exit status.
///
/// Rendered output goes to stdout, so diagnostics never mix into a piped
/// page.
fn report(err: CliError, verbose: bool, color: bool) -> ExitCode {
    err.log();
    let message = if color && std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        err.format_colored(verbose)
    } else {
        err.format_plain(verbose)
    };
    eprint!("{message}");
    ExitCode::from(err.exit_code())
}
