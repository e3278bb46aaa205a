//! Diagnostics for the `stencil` binary.
//!
//! The library crates only emit events; this is the one place a subscriber
//! is installed. Events go to stderr so a rendered page on stdout stays
//! clean. What each level shows:
//!
//! | Flag      | Level | Adds                                      |
//! |-----------|-------|-------------------------------------------|
//! | `--quiet` | error |                                           |
//! | (none)    | warn  | failed reloads, ambiguous layout tags     |
//! | `-v`      | info  | compiles and recompiles                   |
//! | `-vv`     | debug | cache hits and misses, watch events       |
//! | `-vvv`    | trace | compiler internals                        |
//!
//! A set `RUST_LOG` replaces the whole filter.

use std::io::IsTerminal as _;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::GlobalArgs;

/// Targets that follow `-v`/`-q`; everything else stays at the default.
const TARGETS: [&str; 3] = ["stencil", "stencil_core", "stencil_adapters"];

/// Install the stderr subscriber. Call once, before the first event.
pub fn init_logging(args: &GlobalArgs) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(level(args))));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_ansi(!args.no_color && std::io::stderr().is_terminal())
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("cannot install log subscriber: {e}"))
}

fn filter_directives(level: &str) -> String {
    TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn level(args: &GlobalArgs) -> &'static str {
    match (args.quiet, args.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    }
}
