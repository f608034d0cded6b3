// src/proc/compose.rs

//! Lowering command expressions into spawned process chains.

use std::fmt;
use std::sync::Arc;

use tokio::net::unix::pipe;
use tracing::{debug, warn};

use crate::cmd::CommandExpr;
use crate::errors::{ProcError, Result};
use crate::proc::process::{signals, Process};
use crate::proc::spawn::spawn_one;
use crate::stdio::pipe::link_pipe;
use crate::stdio::redirect::{setup_slot, Attachment, Redirect, SlotValue};

/// Processes spawned from one command expression, in spawn order
/// (left-to-right), plus the parent-side pipe endpoints created by
/// `Piped` redirects.
pub struct ProcessChain {
    procs: Vec<Arc<Process>>,
    /// Parent writes here to feed the chain's stdin.
    pub stdin: Option<pipe::Sender>,
    /// Parent reads the chain's stdout here.
    pub stdout: Option<pipe::Receiver>,
    /// Parent reads the chain's stderr here.
    pub stderr: Option<pipe::Receiver>,
}

impl fmt::Debug for ProcessChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessChain")
            .field("procs", &self.procs.len())
            .field("stdin", &self.stdin.is_some())
            .field("stdout", &self.stdout.is_some())
            .field("stderr", &self.stderr.is_some())
            .finish()
    }
}

impl ProcessChain {
    fn empty() -> Self {
        ProcessChain {
            procs: Vec::new(),
            stdin: None,
            stdout: None,
            stderr: None,
        }
    }

    /// Chain members in spawn order.
    pub fn procs(&self) -> &[Arc<Process>] {
        &self.procs
    }

    /// The single process of a one-command chain.
    pub fn single(&self) -> Option<&Arc<Process>> {
        match self.procs.as_slice() {
            [one] => Some(one),
            _ => None,
        }
    }

    /// Wait for every member, in spawn order.
    pub async fn wait(&self, join_forwarders: bool) {
        for proc in &self.procs {
            proc.wait(join_forwarders).await;
        }
    }

    /// Deliver `signum` to every member. The first failure is returned,
    /// but delivery is still attempted on the rest.
    #[cfg(unix)]
    pub fn kill(&self, signum: i32) -> Result<()> {
        let mut first_err = None;
        for proc in &self.procs {
            if let Err(err) = proc.kill(signum) {
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// True when every member exited normally with code 0, regardless of
    /// `ignore_status` (which only affects [`check_success`]).
    ///
    /// [`check_success`]: ProcessChain::check_success
    pub fn success(&self) -> bool {
        self.procs.iter().all(|p| p.success())
    }

    /// Error out if any member failed without `ignore_status`, reporting
    /// the failures in spawn order.
    pub fn check_success(&self) -> Result<()> {
        let failed: Vec<_> = self
            .procs
            .iter()
            .filter(|p| !p.success() && !p.spec().ignores_status())
            .map(|p| p.failure())
            .collect();
        if failed.is_empty() {
            Ok(())
        } else {
            Err(ProcError::Failed(failed))
        }
    }

    fn attach(&mut self, fd: u32, attachment: Attachment) {
        match attachment {
            Attachment::In(sender) => {
                if self.stdin.replace(sender).is_some() {
                    warn!(fd, "replacing an earlier stdin attachment");
                }
            }
            Attachment::Out(receiver) => {
                let slot = if fd == 2 {
                    &mut self.stderr
                } else {
                    &mut self.stdout
                };
                if slot.replace(receiver).is_some() {
                    warn!(fd, "replacing an earlier output attachment");
                }
            }
        }
    }
}

/// Resolve the top-level redirects, lower the expression, and return the
/// chain. If any spawn fails, every process spawned so far is killed and
/// reaped before the error propagates; partial pipelines are never left
/// running.
pub(crate) async fn spawn_expr(
    expr: CommandExpr,
    redirects: [Redirect; 3],
) -> Result<ProcessChain> {
    let mut chain = ProcessChain::empty();

    let result = (|| {
        let mut slots: [SlotValue; 3] = [SlotValue::Null, SlotValue::Null, SlotValue::Null];
        for (fd, redirect) in redirects.into_iter().enumerate() {
            let setup = setup_slot(redirect, fd as u32)?;
            slots[fd] = setup.value;
            if let Some(attachment) = setup.attach {
                chain.attach(fd as u32, attachment);
            }
        }
        compose(expr, &slots, &mut chain)
    })();

    match result {
        Ok(()) => Ok(chain),
        Err(err) => {
            abort_partial(&chain).await;
            Err(err)
        }
    }
}

/// Kill and reap a partially spawned chain after a composition failure.
async fn abort_partial(chain: &ProcessChain) {
    if chain.procs.is_empty() {
        return;
    }
    warn!(
        spawned = chain.procs.len(),
        "composition failed; killing already-spawned children"
    );
    for proc in &chain.procs {
        let _ = proc.kill(signals::SIGKILL);
    }
    // Forwarder pipes EOF once the children are gone, so joining them is
    // not needed to reclaim the descriptors.
    chain.wait(false).await;
}

/// Recursive lowering over a fixed 3-slot stdio vector, indexed by fd
/// (0=stdin, 1=stdout, 2=stderr).
fn compose(expr: CommandExpr, stdio: &[SlotValue; 3], chain: &mut ProcessChain) -> Result<()> {
    match expr {
        CommandExpr::Single(spec) => {
            let proc = spawn_one(&spec, stdio)?;
            chain.procs.push(proc);
            Ok(())
        }
        CommandExpr::Pipe(a, b) => {
            let (read_end, write_end) = link_pipe(false, false)?;
            debug!("linked stdout pipe");
            let mut left = stdio.clone();
            left[1] = SlotValue::owned(write_end);
            compose(*a, &left, chain)?;
            drop(left);

            let mut right = stdio.clone();
            right[0] = SlotValue::owned(read_end);
            compose(*b, &right, chain)
        }
        CommandExpr::ErrPipe(a, b) => {
            let (read_end, write_end) = link_pipe(false, false)?;
            debug!("linked stderr pipe");
            let mut left = stdio.clone();
            left[2] = SlotValue::owned(write_end);
            compose(*a, &left, chain)?;
            drop(left);

            let mut right = stdio.clone();
            right[0] = SlotValue::owned(read_end);
            compose(*b, &right, chain)
        }
        CommandExpr::And(a, b) => {
            // Both children get duplicates of the same handles; output
            // interleaving is unspecified.
            compose(*a, stdio, chain)?;
            compose(*b, stdio, chain)
        }
        CommandExpr::Redirect { fd, target, inner } => {
            if fd > 2 {
                return Err(ProcError::InvalidArgument(format!(
                    "cannot redirect fd {fd}; only stdin/stdout/stderr slots exist"
                )));
            }
            let setup = setup_slot(target, fd)?;
            let mut slots = stdio.clone();
            slots[fd as usize] = setup.value;
            if let Some(attachment) = setup.attach {
                chain.attach(fd, attachment);
            }
            compose(*inner, &slots, chain)
        }
    }
}
