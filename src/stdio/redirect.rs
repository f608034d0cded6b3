// src/stdio/redirect.rs

//! User-facing stdio redirections and their translation into spawn slots.

use std::fmt;
use std::fs::OpenOptions;
use std::io;
use std::os::fd::OwnedFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::unix::pipe;

use crate::errors::{ProcError, Result};
use crate::stdio::forward::{forward_from_child, forward_into_child, Forwarder};
use crate::stdio::pipe::{async_reader, async_writer, link_pipe};

/// What a child stdio slot should be connected to.
pub enum Redirect {
    /// The slot reads from / writes to /dev/null.
    Null,
    /// The child shares the parent's descriptor for that slot.
    Inherit,
    /// Link an internal pipe; the parent-side end is attached to the
    /// resulting chain as `stdin` / `stdout` / `stderr`.
    Piped,
    /// A descriptor supplied by the caller. Ownership transfers to the
    /// setup, which closes it once the child holds its duplicate.
    Fd(OwnedFd),
    /// Open `path` for the child: read-only when the child reads the slot,
    /// otherwise write-only with create (mode 0644) plus append or
    /// truncate.
    File { path: PathBuf, append: bool },
    /// An in-process stream the child's input is read from. A forwarder
    /// task copies it into an internal pipe.
    Reader(Box<dyn AsyncRead + Send + Unpin>),
    /// An in-process stream the child's output is copied into.
    Writer(Box<dyn AsyncWrite + Send + Unpin>),
}

impl Redirect {
    /// Redirect to `path`, truncating any existing file.
    pub fn file<P: Into<PathBuf>>(path: P) -> Self {
        Redirect::File {
            path: path.into(),
            append: false,
        }
    }

    /// Redirect to `path`, appending to any existing file.
    pub fn append<P: Into<PathBuf>>(path: P) -> Self {
        Redirect::File {
            path: path.into(),
            append: true,
        }
    }

    pub fn reader<R: AsyncRead + Send + Unpin + 'static>(r: R) -> Self {
        Redirect::Reader(Box::new(r))
    }

    pub fn writer<W: AsyncWrite + Send + Unpin + 'static>(w: W) -> Self {
        Redirect::Writer(Box::new(w))
    }
}

impl fmt::Debug for Redirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Redirect::Null => write!(f, "Null"),
            Redirect::Inherit => write!(f, "Inherit"),
            Redirect::Piped => write!(f, "Piped"),
            Redirect::Fd(fd) => write!(f, "Fd({fd:?})"),
            Redirect::File { path, append } => {
                write!(f, "File {{ path: {path:?}, append: {append} }}")
            }
            Redirect::Reader(_) => write!(f, "Reader(..)"),
            Redirect::Writer(_) => write!(f, "Writer(..)"),
        }
    }
}

impl fmt::Display for Redirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Redirect::Null => write!(f, "null"),
            Redirect::Inherit => write!(f, "inherit"),
            Redirect::Piped => write!(f, "pipe"),
            Redirect::Fd(_) => write!(f, "fd"),
            Redirect::File { path, append } => {
                if *append {
                    write!(f, ">>{}", path.display())
                } else {
                    write!(f, "{}", path.display())
                }
            }
            Redirect::Reader(_) => write!(f, "stream"),
            Redirect::Writer(_) => write!(f, "stream"),
        }
    }
}

/// One resolved stdio slot, as handed to the spawn call.
///
/// Closing discipline is carried by ownership: a `Shared` slot holds the
/// descriptor alive exactly as long as some composition arm still needs
/// it, and the last drop after the spawns closes it. `Null` and `Inherit`
/// own nothing.
#[derive(Clone)]
pub(crate) enum SlotValue {
    Null,
    Inherit,
    Shared {
        fd: Arc<OwnedFd>,
        forwarder: Option<Forwarder>,
    },
}

impl SlotValue {
    pub(crate) fn owned(fd: OwnedFd) -> Self {
        SlotValue::Shared {
            fd: Arc::new(fd),
            forwarder: None,
        }
    }

    /// Produce the `Stdio` for one spawn. Shared descriptors are
    /// duplicated so every child gets its own copy and the slot can be
    /// reused by sibling spawns.
    pub(crate) fn to_stdio(&self) -> io::Result<Stdio> {
        match self {
            SlotValue::Null => Ok(Stdio::null()),
            SlotValue::Inherit => Ok(Stdio::inherit()),
            SlotValue::Shared { fd, .. } => {
                let dup = fd.try_clone()?;
                Ok(Stdio::from(dup))
            }
        }
    }

    pub(crate) fn forwarder(&self) -> Option<Forwarder> {
        match self {
            SlotValue::Shared { forwarder, .. } => forwarder.clone(),
            _ => None,
        }
    }
}

/// Parent-side endpoint created by a `Piped` redirect.
pub(crate) enum Attachment {
    In(pipe::Sender),
    Out(pipe::Receiver),
}

/// Result of resolving one [`Redirect`] for one slot.
pub(crate) struct SlotSetup {
    pub(crate) value: SlotValue,
    pub(crate) attach: Option<Attachment>,
}

impl SlotSetup {
    fn plain(value: SlotValue) -> Self {
        SlotSetup {
            value,
            attach: None,
        }
    }
}

/// Resolve a redirect for the slot of file descriptor `fd`.
///
/// `fd == 0` means the child reads the slot; higher fds mean the child
/// writes it. Every descriptor acquired here is an `OwnedFd`, so an error
/// return closes everything acquired so far.
pub(crate) fn setup_slot(redirect: Redirect, fd: u32) -> Result<SlotSetup> {
    let child_readable = fd == 0;
    match redirect {
        Redirect::Null => Ok(SlotSetup::plain(SlotValue::Null)),
        Redirect::Inherit => Ok(SlotSetup::plain(SlotValue::Inherit)),
        Redirect::Fd(owned) => Ok(SlotSetup::plain(SlotValue::owned(owned))),
        Redirect::File { path, append } => {
            let file = if child_readable {
                OpenOptions::new().read(true).open(&path)?
            } else {
                OpenOptions::new()
                    .write(true)
                    .create(true)
                    .append(append)
                    .truncate(!append)
                    .mode(0o644)
                    .open(&path)?
            };
            Ok(SlotSetup::plain(SlotValue::owned(file.into())))
        }
        Redirect::Piped => {
            if child_readable {
                let (read_end, write_end) = link_pipe(false, true)?;
                let sender = async_writer(write_end)?;
                Ok(SlotSetup {
                    value: SlotValue::owned(read_end),
                    attach: Some(Attachment::In(sender)),
                })
            } else {
                let (read_end, write_end) = link_pipe(true, false)?;
                let receiver = async_reader(read_end)?;
                Ok(SlotSetup {
                    value: SlotValue::owned(write_end),
                    attach: Some(Attachment::Out(receiver)),
                })
            }
        }
        Redirect::Reader(stream) => {
            if !child_readable {
                return Err(ProcError::InvalidArgument(format!(
                    "cannot feed fd {fd} from a reader; the child writes that slot"
                )));
            }
            let (read_end, write_end) = link_pipe(false, true)?;
            let sender = async_writer(write_end)?;
            let forwarder = forward_into_child(stream, sender);
            Ok(SlotSetup::plain(SlotValue::Shared {
                fd: Arc::new(read_end),
                forwarder: Some(forwarder),
            }))
        }
        Redirect::Writer(stream) => {
            if child_readable {
                return Err(ProcError::InvalidArgument(
                    "cannot drain fd 0 into a writer; the child reads that slot".into(),
                ));
            }
            let (read_end, write_end) = link_pipe(true, false)?;
            let receiver = async_reader(read_end)?;
            let forwarder = forward_from_child(receiver, stream);
            Ok(SlotSetup::plain(SlotValue::Shared {
                fd: Arc::new(write_end),
                forwarder: Some(forwarder),
            }))
        }
    }
}
