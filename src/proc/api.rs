// src/proc/api.rs

//! High-level lifecycle API over the composer.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader, Lines};
use tokio::net::unix::pipe;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::cmd::CommandExpr;
use crate::errors::{ProcError, Result};
use crate::proc::compose::{spawn_expr, ProcessChain};
use crate::proc::process::{signals, Process};
use crate::stdio::Redirect;

/// How long a scoped process gets to exit on its own before `SIGTERM`.
const KILL_GRACE: Duration = Duration::from_secs(2);

/// Which directions [`open`] should pipe back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Pipe the chain's stdout to the caller.
    Read,
    /// Pipe the caller to the chain's stdin.
    Write,
    /// Pipe both directions.
    ReadWrite,
}

/// Run an expression to completion with the parent's stdio and fail if
/// any member exits unsuccessfully.
pub async fn run(expr: CommandExpr) -> Result<ProcessChain> {
    info!(expr = %expr, "running");
    let chain = spawn_expr(
        expr,
        [Redirect::Inherit, Redirect::Inherit, Redirect::Inherit],
    )
    .await?;
    chain.wait(true).await;
    chain.check_success()?;
    Ok(chain)
}

/// Spawn an expression without waiting.
///
/// Stdio defaults to swallowing (`Null`); pass `Piped` entries to get the
/// corresponding endpoints attached to the returned chain.
pub async fn start(expr: CommandExpr, stdio: [Redirect; 3]) -> Result<ProcessChain> {
    info!(expr = %expr, "starting");
    spawn_expr(expr, stdio).await
}

/// Spawn an expression wired for direct parent I/O.
///
/// The requested directions become pipe endpoints on the returned chain;
/// `other` supplies the opposite slot (stdin for `Read`, stdout for
/// `Write`); stderr stays inherited. `ReadWrite` leaves no free slot, so
/// it rejects any `other` except `Null`.
pub async fn open(expr: CommandExpr, mode: OpenMode, other: Redirect) -> Result<ProcessChain> {
    let redirects = match mode {
        OpenMode::Read => [other, Redirect::Piped, Redirect::Inherit],
        OpenMode::Write => [Redirect::Piped, other, Redirect::Inherit],
        OpenMode::ReadWrite => {
            if !matches!(other, Redirect::Null) {
                return Err(ProcError::InvalidArgument(
                    "ReadWrite already pipes both ends; extra stdio must be Null".into(),
                ));
            }
            [Redirect::Piped, Redirect::Piped, Redirect::Inherit]
        }
    };
    spawn_expr(expr, redirects).await
}

/// Capture the expression's entire stdout as bytes, then fail on an
/// unsuccessful exit.
pub async fn read(expr: CommandExpr) -> Result<Vec<u8>> {
    let mut chain = open(expr, OpenMode::Read, Redirect::Null).await?;
    let mut out = Vec::new();
    if let Some(mut stdout) = chain.stdout.take() {
        stdout.read_to_end(&mut out).await?;
    }
    chain.wait(true).await;
    chain.check_success()?;
    Ok(out)
}

/// Capture the expression's entire stdout as text (lossy UTF-8).
pub async fn read_to_string(expr: CommandExpr) -> Result<String> {
    let bytes = read(expr).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Run the expression with swallowed stdio and report whether every
/// member exited with code 0.
pub async fn success(expr: CommandExpr) -> Result<bool> {
    let chain = spawn_expr(expr, [Redirect::Null, Redirect::Null, Redirect::Inherit]).await?;
    chain.wait(true).await;
    Ok(chain.success())
}

/// Line iterator over a chain's stdout.
///
/// Once the stream ends, the chain is waited and its exit status checked,
/// so the final `next_line` call surfaces `ProcError::Failed` for an
/// unsuccessful pipeline.
pub struct ProcessLines {
    chain: ProcessChain,
    lines: Lines<BufReader<pipe::Receiver>>,
    finished: bool,
}

impl ProcessLines {
    /// Next stdout line, or `None` after EOF and a successful exit check.
    pub async fn next_line(&mut self) -> Result<Option<String>> {
        if self.finished {
            return Ok(None);
        }
        match self.lines.next_line().await? {
            Some(line) => Ok(Some(line)),
            None => {
                self.finished = true;
                self.chain.wait(true).await;
                self.chain.check_success()?;
                Ok(None)
            }
        }
    }

    pub fn chain(&self) -> &ProcessChain {
        &self.chain
    }
}

/// Stream lines from the expression's stdout.
pub async fn lines(expr: CommandExpr) -> Result<ProcessLines> {
    let mut chain = open(expr, OpenMode::Read, Redirect::Null).await?;
    let stdout = chain
        .stdout
        .take()
        .ok_or_else(|| ProcError::InvalidArgument("chain has no stdout pipe".into()))?;
    Ok(ProcessLines {
        chain,
        lines: BufReader::new(stdout).lines(),
        finished: false,
    })
}

/// Run `f` with a freshly opened chain and guarantee cleanup.
///
/// On success of `f`: stdin is closed, stdout must be at EOF (anything
/// left unread is an error), then the chain is waited and its status
/// checked. On failure of `f` (or the EOF check): stdin is closed, the
/// chain gets [`KILL_GRACE`] to exit on its own before `SIGTERM`, and is
/// then waited before the error is returned. Either way no process and no
/// descriptor outlives the call.
pub async fn with_process<T, F, Fut>(expr: CommandExpr, mode: OpenMode, f: F) -> Result<T>
where
    F: FnOnce(&mut ProcessChain) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut chain = open(expr, mode, Redirect::Null).await?;

    match f(&mut chain).await {
        Ok(value) => {
            drop(chain.stdin.take());
            if let Some(mut stdout) = chain.stdout.take() {
                let mut probe = [0u8; 1];
                let n = stdout.read(&mut probe).await.unwrap_or(0);
                if n > 0 {
                    debug!("stdout not at EOF after scoped closure");
                    terminate_and_wait(&chain).await;
                    return Err(ProcError::BrokenPipe);
                }
            }
            chain.wait(true).await;
            chain.check_success()?;
            Ok(value)
        }
        Err(err) => {
            drop(chain.stdin.take());
            terminate_and_wait(&chain).await;
            Err(err)
        }
    }
}

/// Give the chain [`KILL_GRACE`] to exit, then SIGTERM whatever is left,
/// and wait for everything.
async fn terminate_and_wait(chain: &ProcessChain) {
    let procs: Vec<Arc<Process>> = chain.procs().to_vec();
    let grace = tokio::spawn(async move {
        sleep(KILL_GRACE).await;
        for proc in procs {
            if proc.running() {
                debug!(cmd = %proc.spec(), "grace period expired; sending SIGTERM");
                let _ = proc.kill(signals::SIGTERM);
            }
        }
    });
    chain.wait(false).await;
    grace.abort();
}
