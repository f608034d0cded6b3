// src/cmd/spec.rs

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::PathBuf;

/// Spawn option bits carried on a [`CommandSpec`].
///
/// Only `DETACHED` has an effect on Unix (the child is started in its own
/// session via `setsid`). The `WINDOWS_*` bits exist so specs can be built
/// portably; they are consulted only on Windows builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpawnFlags(u32);

impl SpawnFlags {
    pub const DETACHED: SpawnFlags = SpawnFlags(1 << 0);
    pub const WINDOWS_VERBATIM_ARGS: SpawnFlags = SpawnFlags(1 << 1);
    pub const WINDOWS_HIDE: SpawnFlags = SpawnFlags(1 << 2);

    pub fn empty() -> Self {
        SpawnFlags(0)
    }

    pub fn contains(self, other: SpawnFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for SpawnFlags {
    type Output = SpawnFlags;

    fn bitor(self, rhs: SpawnFlags) -> SpawnFlags {
        SpawnFlags(self.0 | rhs.0)
    }
}

/// Everything needed to start one external program.
///
/// A spec is immutable input to the spawn machinery: argv (never empty),
/// an optional exact environment (`None` means inherit the parent's), an
/// optional working directory, spawn flags, an optional cpu affinity mask,
/// and whether a non-zero exit should be ignored by success checks.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    argv: Vec<OsString>,
    env: Option<Vec<(OsString, OsString)>>,
    cwd: Option<PathBuf>,
    flags: SpawnFlags,
    cpumask: Option<Vec<bool>>,
    ignore_status: bool,
}

impl CommandSpec {
    /// Build a spec from an argv. Emptiness is checked at spawn time, not
    /// here, so specs can be assembled incrementally.
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        CommandSpec {
            argv: argv.into_iter().map(Into::into).collect(),
            env: None,
            cwd: None,
            flags: SpawnFlags::empty(),
            cpumask: None,
            ignore_status: false,
        }
    }

    /// Append one argument.
    pub fn arg<S: Into<OsString>>(mut self, arg: S) -> Self {
        self.argv.push(arg.into());
        self
    }

    /// Replace the child's environment with exactly these entries.
    ///
    /// Without this the child inherits the parent's environment.
    pub fn env<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        self.env = Some(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Set the child's working directory.
    pub fn cwd<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn flags(mut self, flags: SpawnFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Pin the child to the CPUs whose indices are `true` in the mask.
    pub fn cpumask(mut self, mask: Vec<bool>) -> Self {
        self.cpumask = Some(mask);
        self
    }

    /// Exclude this command from `ProcError::Failed` reporting.
    pub fn ignore_status(mut self, ignore: bool) -> Self {
        self.ignore_status = ignore;
        self
    }

    pub fn argv(&self) -> &[OsString] {
        &self.argv
    }

    pub fn get_env(&self) -> Option<&[(OsString, OsString)]> {
        self.env.as_deref()
    }

    pub fn get_cwd(&self) -> Option<&PathBuf> {
        self.cwd.as_ref()
    }

    pub fn get_flags(&self) -> SpawnFlags {
        self.flags
    }

    pub fn get_cpumask(&self) -> Option<&[bool]> {
        self.cpumask.as_deref()
    }

    pub fn ignores_status(&self) -> bool {
        self.ignore_status
    }
}

impl fmt::Display for CommandSpec {
    /// Shell-like rendering used in logs and error messages: arguments
    /// containing whitespace or quote characters are single-quoted.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arg) in self.argv.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", quoted(arg))?;
        }
        Ok(())
    }
}

fn quoted(arg: &OsStr) -> String {
    let s = arg.to_string_lossy();
    let needs_quotes =
        s.is_empty() || s.contains(|c: char| c.is_whitespace() || c == '\'' || c == '"');
    if needs_quotes {
        format!("'{}'", s.replace('\'', "\\'"))
    } else {
        s.into_owned()
    }
}
