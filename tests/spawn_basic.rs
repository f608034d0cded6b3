use std::error::Error;
use std::time::{Duration, Instant};

use procpipe::{run, signals, start, CommandExpr, CommandSpec, ProcError, Redirect};

type TestResult = Result<(), Box<dyn Error>>;

fn swallow() -> [Redirect; 3] {
    [Redirect::Null, Redirect::Null, Redirect::Null]
}

#[tokio::test]
async fn true_exits_zero() -> TestResult {
    let chain = run(CommandExpr::cmd(["true"])).await?;
    let proc = chain.single().expect("one process");
    assert_eq!(proc.exit_code(), Some(0));
    assert_eq!(proc.term_signal(), Some(0));
    assert!(proc.success());
    assert!(proc.exited());
    assert!(!proc.signaled());
    Ok(())
}

#[tokio::test]
async fn false_reports_failure() -> TestResult {
    let err = run(CommandExpr::cmd(["false"])).await.expect_err("must fail");
    match err {
        ProcError::Failed(failed) => {
            assert_eq!(failed.len(), 1);
            assert_eq!(failed[0].cmd, "false");
            assert_eq!(failed[0].exit_code, 1);
        }
        other => panic!("expected Failed, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn ignore_status_suppresses_failure() -> TestResult {
    let spec = CommandSpec::new(["false"]).ignore_status(true);
    let chain = run(CommandExpr::Single(spec)).await?;
    let proc = chain.single().expect("one process");
    assert_eq!(proc.exit_code(), Some(1));
    assert!(!proc.success());
    assert!(!chain.success());
    Ok(())
}

#[tokio::test]
async fn empty_argv_is_invalid() {
    let err = run(CommandExpr::Single(CommandSpec::new(Vec::<String>::new())))
        .await
        .expect_err("must fail");
    assert!(matches!(err, ProcError::InvalidArgument(_)));
}

#[tokio::test]
async fn missing_program_is_spawn_error() {
    let err = run(CommandExpr::cmd(["/nonexistent/procpipe-test-binary"]))
        .await
        .expect_err("must fail");
    match err {
        ProcError::Spawn { cmd, .. } => assert!(cmd.contains("procpipe-test-binary")),
        other => panic!("expected Spawn, got {other:?}"),
    }
}

#[tokio::test]
async fn exit_fields_pending_while_running() -> TestResult {
    let chain = start(CommandExpr::cmd(["sleep", "5"]), swallow()).await?;
    let proc = chain.single().expect("one process").clone();

    assert!(proc.running());
    assert_eq!(proc.exit_code(), None);
    assert_eq!(proc.term_signal(), None);
    assert!(!proc.success());

    proc.kill(signals::SIGKILL)?;
    proc.wait(true).await;
    assert_eq!(proc.term_signal(), Some(signals::SIGKILL));
    Ok(())
}

#[tokio::test]
async fn kill_is_idempotent_after_exit() -> TestResult {
    let chain = start(CommandExpr::cmd(["sleep", "1000"]), swallow()).await?;
    let proc = chain.single().expect("one process").clone();

    let pid = proc.pid()?;
    assert!(pid > 0);

    proc.kill(signals::SIGTERM)?;
    proc.wait(true).await;
    assert!(proc.exited());
    assert!(proc.signaled());
    assert_eq!(proc.term_signal(), Some(signals::SIGTERM));

    // Killing an exited process must not raise.
    proc.kill(signals::SIGTERM)?;
    assert!(proc.pid().is_err());
    Ok(())
}

#[tokio::test]
async fn bad_signal_number_is_invalid() -> TestResult {
    let chain = start(CommandExpr::cmd(["sleep", "1"]), swallow()).await?;
    let proc = chain.single().expect("one process").clone();
    let err = proc.kill(99_999).expect_err("bad signal");
    assert!(matches!(err, ProcError::InvalidArgument(_)));
    proc.kill(signals::SIGKILL)?;
    proc.wait(true).await;
    Ok(())
}

#[tokio::test]
async fn wait_returns_quickly_for_exited_process() -> TestResult {
    let chain = run(CommandExpr::cmd(["true"])).await?;
    let proc = chain.single().expect("one process").clone();

    // A second wait on an already-exited process must not block.
    let started = Instant::now();
    proc.wait(true).await;
    assert!(started.elapsed() < Duration::from_secs(1));
    Ok(())
}

#[tokio::test]
async fn custom_env_and_cwd_are_applied() -> TestResult {
    let spec = CommandSpec::new(["sh", "-c", "test \"$PROCPIPE_MARK\" = yes && test \"$PWD\" = /"])
        .env([("PROCPIPE_MARK", "yes"), ("PATH", "/usr/bin:/bin")])
        .cwd("/");
    run(CommandExpr::Single(spec)).await?;
    Ok(())
}
