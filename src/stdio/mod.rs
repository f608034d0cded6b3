// src/stdio/mod.rs

//! Child stdio plumbing.
//!
//! - [`pipe`] creates raw OS pipe pairs and wraps parent-side ends for
//!   async I/O.
//! - [`forward`] owns the background tasks that copy bytes between
//!   in-process streams and pipe ends.
//! - [`redirect`] converts user-facing [`Redirect`] values into the slots
//!   handed to the spawn call.

pub mod forward;
pub mod pipe;
pub mod redirect;

pub use redirect::Redirect;
