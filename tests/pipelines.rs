use std::error::Error;
use std::time::{Duration, Instant};

use procpipe::{read_to_string, run, start, success, CommandExpr, ProcError, Redirect};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn pipe_counts_bytes() -> TestResult {
    let expr = CommandExpr::cmd(["printf", "hello"]).pipe(CommandExpr::cmd(["wc", "-c"]));
    let out = read_to_string(expr).await?;
    assert_eq!(out.trim(), "5");
    Ok(())
}

#[tokio::test]
async fn err_pipe_feeds_stderr_downstream() -> TestResult {
    let expr = CommandExpr::cmd(["sh", "-c", "echo err 1>&2"])
        .err_pipe(CommandExpr::cmd(["cat"]));
    let out = read_to_string(expr).await?;
    assert_eq!(out, "err\n");
    Ok(())
}

#[tokio::test]
async fn nested_pipeline_flows_left_to_right() -> TestResult {
    let expr = CommandExpr::cmd(["printf", "a\nb\nc\n"])
        .pipe(CommandExpr::cmd(["grep", "b"]))
        .pipe(CommandExpr::cmd(["wc", "-l"]));
    let out = read_to_string(expr).await?;
    assert_eq!(out.trim(), "1");
    Ok(())
}

#[tokio::test]
async fn chain_lists_processes_in_spawn_order() -> TestResult {
    let expr = CommandExpr::cmd(["printf", "x"])
        .pipe(CommandExpr::cmd(["cat"]))
        .pipe(CommandExpr::cmd(["cat", "-"]));
    let chain = run(expr).await?;
    let cmds: Vec<String> = chain.procs().iter().map(|p| p.spec().to_string()).collect();
    assert_eq!(cmds, vec!["printf x", "cat", "cat -"]);
    Ok(())
}

#[tokio::test]
async fn success_reflects_pipeline_members() -> TestResult {
    let ok = success(CommandExpr::cmd(["true"]).pipe(CommandExpr::cmd(["true"]))).await?;
    assert!(ok);

    let bad = success(CommandExpr::cmd(["false"]).pipe(CommandExpr::cmd(["true"]))).await?;
    assert!(!bad);
    Ok(())
}

#[tokio::test]
async fn failed_pipeline_reports_left_process_first() -> TestResult {
    let expr = CommandExpr::cmd(["false"]).pipe(CommandExpr::cmd(["true"]));
    let err = run(expr).await.expect_err("left side fails");
    match err {
        ProcError::Failed(failed) => {
            assert_eq!(failed.len(), 1);
            assert_eq!(failed[0].cmd, "false");
        }
        other => panic!("expected Failed, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn and_runs_both_with_shared_stdout() -> TestResult {
    let expr = CommandExpr::cmd(["echo", "alpha"]).and(CommandExpr::cmd(["echo", "beta"]));
    let out = read_to_string(expr).await?;
    let mut lines: Vec<&str> = out.lines().collect();
    lines.sort_unstable();
    assert_eq!(lines, vec!["alpha", "beta"]);
    Ok(())
}

#[tokio::test]
async fn failed_spawn_kills_partial_chain() {
    let expr = CommandExpr::cmd(["sleep", "30"])
        .pipe(CommandExpr::cmd(["/nonexistent/procpipe-test-binary"]));

    let started = Instant::now();
    let err = start(expr, [Redirect::Null, Redirect::Null, Redirect::Null])
        .await
        .expect_err("right side cannot spawn");
    assert!(matches!(err, ProcError::Spawn { .. }));

    // The already-spawned `sleep 30` must have been killed and reaped;
    // otherwise the abort path would have blocked on it.
    assert!(started.elapsed() < Duration::from_secs(5));
}
