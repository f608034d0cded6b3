// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for the `procpipe` runner.
///
/// The trailing command may contain `|` tokens, which split it into a
/// stdout pipeline: `procpipe -- printf hello '|' wc -c`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "procpipe",
    version,
    about = "Run a command or pipeline with redirections.",
    long_about = None
)]
pub struct CliArgs {
    /// Print the pipeline's captured stdout instead of inheriting it.
    #[arg(long)]
    pub capture: bool,

    /// Working directory for every command in the pipeline.
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<String>,

    /// Environment entries (KEY=VALUE) replacing the inherited environment.
    #[arg(long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Redirect the pipeline's stdin from this file.
    #[arg(long, value_name = "PATH")]
    pub stdin: Option<String>,

    /// Redirect the pipeline's stdout to this file.
    #[arg(long, value_name = "PATH")]
    pub stdout: Option<String>,

    /// Redirect the pipeline's stderr to this file.
    #[arg(long, value_name = "PATH")]
    pub stderr: Option<String>,

    /// Append to redirected output files instead of truncating.
    #[arg(long)]
    pub append: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PROCPIPE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// The command to run, with optional `|` separators.
    #[arg(
        trailing_var_arg = true,
        allow_hyphen_values = true,
        required = true,
        value_name = "CMD"
    )]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(lvl: LogLevel) -> Self {
        match lvl {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
