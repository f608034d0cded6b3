// src/stdio/forward.rs

//! Background forwarder tasks.
//!
//! A forwarder copies bytes between an arbitrary in-process stream and one
//! end of an internal pipe until EOF, then closes its pipe end by dropping
//! it. Forwarders are recorded on every process that received the paired
//! child-side end, and `wait(join_forwarders=true)` joins them so a waited
//! process has no I/O still in flight.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::unix::pipe;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// A joinable handle to one forwarder task.
///
/// Cloneable because several processes can share one forwarded slot
/// (`And` composition); `join` is idempotent and safe to call from any
/// number of waiters. Concurrent joins serialize on the inner mutex, so no
/// caller returns before the task has actually finished.
#[derive(Clone)]
pub(crate) struct Forwarder {
    handle: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Forwarder {
    fn new(handle: JoinHandle<()>) -> Self {
        Forwarder {
            handle: Arc::new(Mutex::new(Some(handle))),
        }
    }

    /// Wait for the forwarder task to terminate.
    pub(crate) async fn join(&self) {
        let mut slot = self.handle.lock().await;
        if let Some(handle) = slot.take() {
            if let Err(err) = handle.await {
                warn!(error = %err, "forwarder task panicked");
            }
        }
    }
}

/// Start a task feeding the child: user stream → pipe write end.
///
/// Dropping the sender at the end delivers EOF on the child's stdin.
pub(crate) fn forward_into_child(
    mut reader: Box<dyn AsyncRead + Send + Unpin>,
    mut sender: pipe::Sender,
) -> Forwarder {
    Forwarder::new(tokio::spawn(async move {
        match tokio::io::copy(&mut reader, &mut sender).await {
            Ok(bytes) => debug!(bytes, "input forwarder reached EOF"),
            Err(err) => warn!(error = %err, "input forwarder failed"),
        }
    }))
}

/// Start a task draining the child: pipe read end → user stream.
///
/// The receiver is dropped on exit so the kernel can reclaim the pipe; the
/// user stream is flushed but stays open (the caller owns its lifecycle).
pub(crate) fn forward_from_child(
    mut receiver: pipe::Receiver,
    mut writer: Box<dyn AsyncWrite + Send + Unpin>,
) -> Forwarder {
    Forwarder::new(tokio::spawn(async move {
        match tokio::io::copy(&mut receiver, &mut writer).await {
            Ok(bytes) => {
                debug!(bytes, "output forwarder reached EOF");
                if let Err(err) = writer.flush().await {
                    warn!(error = %err, "output forwarder flush failed");
                }
            }
            Err(err) => warn!(error = %err, "output forwarder failed"),
        }
    }))
}
