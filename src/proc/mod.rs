// src/proc/mod.rs

//! Process lifetime: spawning, composition, waiting and signalling.
//!
//! - [`process`] owns the per-process shared state and the reaper task
//!   that records exit status.
//! - [`spawn`] turns one `CommandSpec` plus resolved stdio slots into a
//!   running [`Process`].
//! - [`compose`] lowers a `CommandExpr` into a [`ProcessChain`].
//! - [`api`] is the high-level lifecycle surface (`run`, `open`, `read`,
//!   `lines`, `with_process`, ...).

pub mod api;
pub mod compose;
pub mod process;
pub mod spawn;

pub use api::{lines, open, read, read_to_string, run, start, success, with_process, OpenMode,
    ProcessLines};
pub use compose::ProcessChain;
pub use process::Process;
