//! Writing command results and status lines to stdout.
//!
//! Results (rendered pages, composed source, JSON) are never suppressed so
//! they can be piped into files. Status lines are decoration: `--quiet`
//! drops them, and `--no-color`, `NO_COLOR` or `output.no_color = true`
//! strips their colour.

use std::io::{self, IsTerminal};

use console::Term;
use owo_colors::OwoColorize;

use crate::cli::global::{GlobalArgs, OutputFormat};
use crate::config::AppConfig;

/// Kind of a decorative status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Success,
    Warning,
    Info,
}

impl Status {
    fn glyph(self) -> &'static str {
        match self {
            Self::Success => "\u{2713}",
            Self::Warning => "\u{26a0}",
            Self::Info => "\u{2139}",
        }
    }

    fn line(self, msg: &str, color: bool) -> String {
        let glyph = self.glyph();
        if !color {
            return format!("{glyph} {msg}");
        }
        match self {
            Self::Success => format!("{} {}", glyph.green().bold(), msg.green()),
            Self::Warning => format!("{} {}", glyph.yellow().bold(), msg.yellow()),
            Self::Info => format!("{} {}", glyph.blue().bold(), msg.blue()),
        }
    }
}

/// Stdout writer shared by every command.
pub struct OutputManager {
    term: Term,
    format: OutputFormat,
    quiet: bool,
    color: bool,
}

impl OutputManager {
    pub fn new(args: &GlobalArgs, config: &AppConfig) -> Self {
        let format = match args.output_format {
            OutputFormat::Auto if io::stdout().is_terminal() => OutputFormat::Human,
            OutputFormat::Auto => OutputFormat::Plain,
            chosen => chosen,
        };

        Self {
            term: Term::stdout(),
            format,
            quiet: args.quiet,
            color: !(args.no_color || config.output.no_color),
        }
    }

    /// A command result, verbatim, newline-terminated.
    pub fn emit(&self, content: &str) -> io::Result<()> {
        self.term.write_str(content)?;
        if !content.ends_with('\n') {
            self.term.write_line("")?;
        }
        Ok(())
    }

    /// A command result as pretty-printed JSON.
    pub fn json(&self, value: &serde_json::Value) -> io::Result<()> {
        let text = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        self.term.write_line(&text)
    }

    pub fn print(&self, msg: &str) -> io::Result<()> {
        self.decorate(msg.to_owned())
    }

    pub fn success(&self, msg: &str) -> io::Result<()> {
        self.decorate(Status::Success.line(msg, self.color))
    }

    pub fn warning(&self, msg: &str) -> io::Result<()> {
        self.decorate(Status::Warning.line(msg, self.color))
    }

    pub fn info(&self, msg: &str) -> io::Result<()> {
        self.decorate(Status::Info.line(msg, self.color))
    }

    pub fn header(&self, text: &str) -> io::Result<()> {
        let line = if self.color {
            text.cyan().bold().to_string()
        } else {
            text.to_owned()
        };
        self.decorate(line)
    }

    fn decorate(&self, line: String) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.term.write_line(&line)
    }

    pub fn supports_color(&self) -> bool {
        self.color
    }

    /// Output format with `Auto` resolved against stdout.
    pub fn format(&self) -> OutputFormat {
        self.format
    }
}
