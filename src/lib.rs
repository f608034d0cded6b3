// src/lib.rs

//! Subprocess execution engine for Unix.
//!
//! `procpipe` spawns external programs, composes them into pipelines, and
//! wires their stdio to files, descriptors, or arbitrary in-process async
//! streams. Expressions are built from [`CommandSpec`] values:
//!
//! ```no_run
//! use procpipe::{read_to_string, CommandExpr};
//!
//! # async fn demo() -> procpipe::Result<()> {
//! let expr = CommandExpr::cmd(["printf", "hello"]).pipe(CommandExpr::cmd(["wc", "-c"]));
//! let count = read_to_string(expr).await?;
//! assert_eq!(count, "5\n");
//! # Ok(())
//! # }
//! ```
//!
//! Every spawned process is tracked by a reaper task, so waiting, killing
//! and exit inspection are race-free, and abandoning a running chain
//! detaches it rather than leaking a zombie.

pub mod cli;
pub mod cmd;
pub mod errors;
pub mod logging;
pub mod proc;
pub mod stdio;

pub use cmd::{CommandExpr, CommandSpec, SpawnFlags};
pub use errors::{FailedProcess, ProcError, Result};
pub use proc::process::signals;
pub use proc::{
    lines, open, read, read_to_string, run, start, success, with_process, OpenMode, Process,
    ProcessChain, ProcessLines,
};
pub use stdio::Redirect;
