// src/cmd/expr.rs

use std::ffi::OsString;
use std::fmt;

use crate::cmd::CommandSpec;
use crate::stdio::Redirect;

/// A command expression: one command, or a composition of commands.
///
/// Expressions form a tree that the composer lowers into spawn calls:
///
/// - `Single(spec)` — one command.
/// - `Pipe(a, b)` — `a`'s stdout feeds `b`'s stdin.
/// - `ErrPipe(a, b)` — `a`'s stderr feeds `b`'s stdin.
/// - `And(a, b)` — both run concurrently with the *same* stdio handles.
///   Each child receives its own duplicate of the descriptors, so
///   concurrent writes to a shared stdout are permitted but interleave
///   arbitrarily.
/// - `Redirect { fd, target, inner }` — `inner` runs with the slot for
///   file descriptor `fd` (0=stdin, 1=stdout, 2=stderr) replaced by
///   `target`.
#[derive(Debug)]
pub enum CommandExpr {
    Single(CommandSpec),
    Pipe(Box<CommandExpr>, Box<CommandExpr>),
    ErrPipe(Box<CommandExpr>, Box<CommandExpr>),
    And(Box<CommandExpr>, Box<CommandExpr>),
    Redirect {
        fd: u32,
        target: Redirect,
        inner: Box<CommandExpr>,
    },
}

impl CommandExpr {
    /// Shorthand for `CommandExpr::Single(CommandSpec::new(argv))`.
    pub fn cmd<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        CommandExpr::Single(CommandSpec::new(argv))
    }

    /// `self | rhs`: connect this expression's stdout to `rhs`'s stdin.
    pub fn pipe(self, rhs: CommandExpr) -> Self {
        CommandExpr::Pipe(Box::new(self), Box::new(rhs))
    }

    /// `self .| rhs`: connect this expression's stderr to `rhs`'s stdin.
    pub fn err_pipe(self, rhs: CommandExpr) -> Self {
        CommandExpr::ErrPipe(Box::new(self), Box::new(rhs))
    }

    /// `self & rhs`: run both concurrently with shared stdio.
    pub fn and(self, rhs: CommandExpr) -> Self {
        CommandExpr::And(Box::new(self), Box::new(rhs))
    }

    /// Replace the slot for `fd` with `target` for the whole expression.
    pub fn redirect_fd(self, fd: u32, target: Redirect) -> Self {
        CommandExpr::Redirect {
            fd,
            target,
            inner: Box::new(self),
        }
    }

    /// The leftmost command spec, which is also the first process spawned.
    pub fn first_spec(&self) -> &CommandSpec {
        match self {
            CommandExpr::Single(spec) => spec,
            CommandExpr::Pipe(a, _) | CommandExpr::ErrPipe(a, _) | CommandExpr::And(a, _) => {
                a.first_spec()
            }
            CommandExpr::Redirect { inner, .. } => inner.first_spec(),
        }
    }
}

impl From<CommandSpec> for CommandExpr {
    fn from(spec: CommandSpec) -> Self {
        CommandExpr::Single(spec)
    }
}

impl fmt::Display for CommandExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandExpr::Single(spec) => write!(f, "{spec}"),
            CommandExpr::Pipe(a, b) => write!(f, "{a} | {b}"),
            CommandExpr::ErrPipe(a, b) => write!(f, "{a} .| {b}"),
            CommandExpr::And(a, b) => write!(f, "{a} & {b}"),
            CommandExpr::Redirect { fd, target, inner } => {
                write!(f, "{inner} {fd}> {target}")
            }
        }
    }
}
