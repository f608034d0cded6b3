// src/errors.rs

//! Crate-wide error types.

use std::fmt;
use std::io;

use thiserror::Error;

/// A chain member that exited unsuccessfully.
///
/// Carried inside [`ProcError::Failed`] in spawn order, so the first entry
/// is always the leftmost failing command of a pipeline.
#[derive(Debug, Clone)]
pub struct FailedProcess {
    /// Displayable form of the command, as rendered by `CommandSpec`.
    pub cmd: String,
    /// Raw exit code of the child.
    pub exit_code: i64,
    /// Terminating signal, or 0 if the child exited normally.
    pub term_signal: i32,
}

impl fmt::Display for FailedProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.term_signal > 0 {
            write!(f, "'{}' [signal {}]", self.cmd, self.term_signal)
        } else {
            write!(f, "'{}' [exit {}]", self.cmd, self.exit_code)
        }
    }
}

#[derive(Error, Debug)]
pub enum ProcError {
    /// Empty argv, a bad signal number, or a contradictory mode combination.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The OS refused to start the process. The command never ran.
    #[error("could not spawn '{cmd}': {source}")]
    Spawn {
        cmd: String,
        #[source]
        source: io::Error,
    },

    /// Delivering a signal failed with something other than "no such process".
    #[cfg(unix)]
    #[error("could not signal process: {0}")]
    Kill(nix::errno::Errno),

    /// The process has already exited; there is no live pid to report.
    #[error("process has exited; no pid available")]
    Pid,

    /// One or more chain members exited non-zero without `ignore_status`.
    #[error("failed process{}: {}", plural_suffix(.0), format_failed(.0))]
    Failed(Vec<FailedProcess>),

    /// A scoped `with_process` closure returned without consuming all of the
    /// child's stdout.
    #[error("child stdout was not consumed to EOF")]
    BrokenPipe,

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

fn plural_suffix(procs: &[FailedProcess]) -> &'static str {
    if procs.len() == 1 {
        ""
    } else {
        "es"
    }
}

fn format_failed(procs: &[FailedProcess]) -> String {
    procs
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, ProcError>;
