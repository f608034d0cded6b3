// src/stdio/pipe.rs

//! Pipe pair creation.
//!
//! All pipe ends are `OwnedFd`, so every failure path in higher-level
//! setup closes half-open ends by drop. Child-side ends stay blocking;
//! parent-side ends are switched to non-blocking before they are wrapped
//! for async I/O.

use std::io;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd};

use nix::fcntl::{fcntl, FcntlArg, OFlag};
use tokio::net::unix::pipe;

/// Create a unidirectional pipe with the requested non-blocking bits.
///
/// Returns `(read_end, write_end)`. Both ends are close-on-exec; the spawn
/// machinery duplicates the child's end into the child explicitly.
pub(crate) fn link_pipe(read_nonblock: bool, write_nonblock: bool) -> io::Result<(OwnedFd, OwnedFd)> {
    let (read_end, write_end) = nix::unistd::pipe2(OFlag::O_CLOEXEC)?;
    if read_nonblock {
        set_nonblock(read_end.as_fd())?;
    }
    if write_nonblock {
        set_nonblock(write_end.as_fd())?;
    }
    Ok((read_end, write_end))
}

fn set_nonblock(fd: BorrowedFd<'_>) -> io::Result<()> {
    let raw_fd = fd.as_raw_fd();
    let flags = fcntl(raw_fd, FcntlArg::F_GETFL)?;
    let new_flags = OFlag::from_bits_truncate(flags) | OFlag::O_NONBLOCK;
    fcntl(raw_fd, FcntlArg::F_SETFL(new_flags))?;
    Ok(())
}

/// Wrap a non-blocking read end for async I/O on the current runtime.
pub(crate) fn async_reader(fd: OwnedFd) -> io::Result<pipe::Receiver> {
    pipe::Receiver::from_owned_fd(fd)
}

/// Wrap a non-blocking write end for async I/O on the current runtime.
pub(crate) fn async_writer(fd: OwnedFd) -> io::Result<pipe::Sender> {
    pipe::Sender::from_owned_fd(fd)
}
