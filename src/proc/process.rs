// src/proc/process.rs

//! The process entity and its waiter.
//!
//! Exit bookkeeping mirrors the event-loop model: a reaper task (the
//! completion callback) writes `exit_code` / `term_signal` exactly once
//! under the state lock, flips `running`, and broadcasts `exit_notify`.
//! Everything that inspects or signals the process takes the same lock, so
//! no caller can observe a half-written exit.

use std::sync::{Arc, Mutex};

use tokio::process::Child;
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::cmd::CommandSpec;
use crate::errors::{FailedProcess, ProcError, Result};
use crate::stdio::forward::Forwarder;

/// POSIX signal numbers delivered via [`Process::kill`].
pub mod signals {
    pub const SIGHUP: i32 = 1;
    pub const SIGINT: i32 = 2;
    #[cfg(unix)]
    pub const SIGQUIT: i32 = 3;
    pub const SIGKILL: i32 = 9;
    #[cfg(unix)]
    pub const SIGPIPE: i32 = 13;
    pub const SIGTERM: i32 = 15;
}

/// Sentinel meaning "the reaper has not run yet".
const EXIT_PENDING: i64 = i64::MIN;
const SIGNAL_PENDING: i32 = i32::MIN;

struct ProcState {
    /// True from spawn until the reaper records the exit. The moral
    /// equivalent of "the loop handle is non-null".
    running: bool,
    exit_code: i64,
    term_signal: i32,
}

/// One spawned child process.
///
/// Cheap to share (`Arc`); all mutation happens in the reaper. Dropping
/// every handle to a running process detaches it: the reaper keeps running
/// and reaps the child, it is never killed implicitly.
pub struct Process {
    spec: CommandSpec,
    pid: u32,
    state: Mutex<ProcState>,
    exit_notify: Notify,
    sync_tasks: Vec<Forwarder>,
}

impl Process {
    pub(crate) fn new(spec: CommandSpec, pid: u32, sync_tasks: Vec<Forwarder>) -> Arc<Self> {
        Arc::new(Process {
            spec,
            pid,
            state: Mutex::new(ProcState {
                running: true,
                exit_code: EXIT_PENDING,
                term_signal: SIGNAL_PENDING,
            }),
            exit_notify: Notify::new(),
            sync_tasks,
        })
    }

    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    /// True until the child has been reaped.
    pub fn running(&self) -> bool {
        self.state.lock().unwrap().running
    }

    pub fn exited(&self) -> bool {
        !self.running()
    }

    /// True when the child was terminated by a signal.
    pub fn signaled(&self) -> bool {
        self.term_signal().map(|sig| sig > 0).unwrap_or(false)
    }

    /// Raw exit code, or `None` while the process is still running.
    pub fn exit_code(&self) -> Option<i64> {
        let state = self.state.lock().unwrap();
        (state.exit_code != EXIT_PENDING).then_some(state.exit_code)
    }

    /// Terminating signal (0 for a normal exit), or `None` while running.
    pub fn term_signal(&self) -> Option<i32> {
        let state = self.state.lock().unwrap();
        (state.term_signal != SIGNAL_PENDING).then_some(state.term_signal)
    }

    /// True once the child exited normally with code 0.
    pub fn success(&self) -> bool {
        let state = self.state.lock().unwrap();
        !state.running && state.exit_code == 0 && state.term_signal == 0
    }

    /// The child's pid. Fails once the process has exited.
    pub fn pid(&self) -> Result<u32> {
        let state = self.state.lock().unwrap();
        if state.running && self.pid > 0 {
            Ok(self.pid)
        } else {
            Err(ProcError::Pid)
        }
    }

    /// Deliver `signum` to the child.
    ///
    /// A process that has already exited is a successful no-op, as is the
    /// race where the child dies between the check and the syscall
    /// (`ESRCH`). Anything else is a real failure.
    #[cfg(unix)]
    pub fn kill(&self, signum: i32) -> Result<()> {
        use nix::errno::Errno;
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let signal = Signal::try_from(signum)
            .map_err(|_| ProcError::InvalidArgument(format!("bad signal number {signum}")))?;

        let state = self.state.lock().unwrap();
        if !state.running {
            debug!(pid = self.pid, signal = signum, "kill on exited process is a no-op");
            return Ok(());
        }
        // pid 0 would address the whole process group.
        if self.pid == 0 {
            return Err(ProcError::Pid);
        }
        match kill(Pid::from_raw(self.pid as i32), signal) {
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(errno) => {
                warn!(pid = self.pid, signal = signum, errno = %errno, "kill failed");
                Err(ProcError::Kill(errno))
            }
        }
    }

    /// Block until the process has exited.
    ///
    /// With `join_forwarders`, additionally wait for every stdio forwarder
    /// task attached to this process, so all user-space I/O has drained by
    /// the time this returns.
    pub async fn wait(&self, join_forwarders: bool) {
        loop {
            // Register interest before re-checking so a broadcast between
            // the check and the await cannot be lost.
            let notified = self.exit_notify.notified();
            if !self.running() {
                break;
            }
            notified.await;
        }
        if join_forwarders {
            for task in &self.sync_tasks {
                task.join().await;
            }
        }
    }

    /// Failure description for error reporting.
    pub(crate) fn failure(&self) -> FailedProcess {
        let state = self.state.lock().unwrap();
        FailedProcess {
            cmd: self.spec.to_string(),
            exit_code: if state.exit_code == EXIT_PENDING {
                -1
            } else {
                state.exit_code
            },
            term_signal: if state.term_signal == SIGNAL_PENDING {
                0
            } else {
                state.term_signal
            },
        }
    }
}

/// Start the reaper task for a freshly spawned child.
///
/// The task owns the `Child`; its completion is the only writer of the
/// exit fields. `exit_notify` is broadcast exactly once, strictly after
/// the fields are written.
pub(crate) fn register_reaper(process: &Arc<Process>, mut child: Child) {
    let proc = Arc::clone(process);
    tokio::spawn(async move {
        let (exit_code, term_signal) = match child.wait().await {
            Ok(status) => split_status(status),
            Err(err) => {
                warn!(pid = proc.pid, error = %err, "waiting on child failed");
                (-1, 0)
            }
        };
        {
            let mut state = proc.state.lock().unwrap();
            state.exit_code = exit_code;
            state.term_signal = term_signal;
            state.running = false;
        }
        debug!(
            pid = proc.pid,
            exit_code, term_signal, "process exited"
        );
        proc.exit_notify.notify_waiters();
    });
}

fn split_status(status: std::process::ExitStatus) -> (i64, i32) {
    if let Some(code) = status.code() {
        return (code as i64, 0);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return (0, sig);
        }
    }
    (-1, 0)
}
