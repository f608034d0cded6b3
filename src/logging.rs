// src/logging.rs

//! Tracing subscriber setup.
//!
//! The level comes from the `--log-level` flag when given, otherwise from
//! the `PROCPIPE_LOG` environment variable, otherwise `warn`. The default
//! is deliberately quiet: the binary's job is to run other programs, and
//! its own chatter must not pollute whatever the children write.

use anyhow::Result;

use crate::cli::LogLevel;

/// Initialise the global subscriber. Call once at startup; logs go to
/// stderr so captured or piped stdout stays clean.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let level = cli_level
        .map(tracing::Level::from)
        .or_else(level_from_env)
        .unwrap_or(tracing::Level::WARN);

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// `tracing::Level` already parses the usual names ("warn", "DEBUG", ...);
/// anything unparseable is ignored rather than fatal.
fn level_from_env() -> Option<tracing::Level> {
    std::env::var("PROCPIPE_LOG").ok()?.trim().parse().ok()
}
