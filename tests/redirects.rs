use std::error::Error;
use std::os::fd::OwnedFd;

use tokio::io::AsyncReadExt;

use procpipe::{read, read_to_string, run, CommandExpr, ProcError, Redirect};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn stderr_redirects_to_file() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("err.out");

    let expr = CommandExpr::cmd(["sh", "-c", "echo x 1>&2"])
        .redirect_fd(2, Redirect::file(&path));
    run(expr).await?;

    assert_eq!(std::fs::read_to_string(&path)?, "x\n");
    Ok(())
}

#[tokio::test]
async fn truncate_replaces_earlier_contents() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("out.txt");

    run(CommandExpr::cmd(["echo", "first"]).redirect_fd(1, Redirect::file(&path))).await?;
    run(CommandExpr::cmd(["echo", "second"]).redirect_fd(1, Redirect::file(&path))).await?;

    assert_eq!(std::fs::read_to_string(&path)?, "second\n");
    Ok(())
}

#[tokio::test]
async fn append_keeps_earlier_contents() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("out.txt");

    run(CommandExpr::cmd(["echo", "first"]).redirect_fd(1, Redirect::file(&path))).await?;
    run(CommandExpr::cmd(["echo", "second"]).redirect_fd(1, Redirect::append(&path))).await?;

    assert_eq!(std::fs::read_to_string(&path)?, "first\nsecond\n");
    Ok(())
}

#[tokio::test]
async fn stdin_redirects_from_file() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("in.txt");
    std::fs::write(&path, "file input")?;

    let expr = CommandExpr::cmd(["cat"]).redirect_fd(0, Redirect::file(&path));
    let out = read_to_string(expr).await?;
    assert_eq!(out, "file input");
    Ok(())
}

#[tokio::test]
async fn caller_owned_fd_receives_stdout() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("fd.out");

    let file = std::fs::File::create(&path)?;
    let fd = OwnedFd::from(file);

    let expr = CommandExpr::cmd(["echo", "through fd"]).redirect_fd(1, Redirect::Fd(fd));
    run(expr).await?;

    assert_eq!(std::fs::read_to_string(&path)?, "through fd\n");
    Ok(())
}

#[tokio::test]
async fn caller_owned_fd_feeds_stdin() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("fd.in");
    std::fs::write(&path, "fd input")?;

    let file = std::fs::File::open(&path)?;
    let fd = OwnedFd::from(file);

    let expr = CommandExpr::cmd(["cat"]).redirect_fd(0, Redirect::Fd(fd));
    let out = read_to_string(expr).await?;
    assert_eq!(out, "fd input");
    Ok(())
}

#[tokio::test]
async fn reader_stream_feeds_child_stdin() -> TestResult {
    let expr = CommandExpr::cmd(["cat"]).redirect_fd(0, Redirect::reader(&b"from memory"[..]));
    let out = read(expr).await?;
    assert_eq!(out, b"from memory");
    Ok(())
}

#[tokio::test]
async fn writer_stream_collects_child_stdout() -> TestResult {
    let (client, mut server) = tokio::io::duplex(4096);

    let expr = CommandExpr::cmd(["printf", "xyz"]).redirect_fd(1, Redirect::writer(client));
    run(expr).await?;

    // run() joined the forwarder, which dropped its end; the duplex now
    // holds the full output followed by EOF.
    let mut collected = Vec::new();
    server.read_to_end(&mut collected).await?;
    assert_eq!(collected, b"xyz");
    Ok(())
}

#[tokio::test]
async fn reader_stream_rejected_for_output_slot() {
    let expr = CommandExpr::cmd(["true"]).redirect_fd(1, Redirect::reader(&b""[..]));
    let err = run(expr).await.expect_err("direction mismatch");
    assert!(matches!(err, ProcError::InvalidArgument(_)));
}

#[tokio::test]
async fn out_of_range_fd_rejected() {
    let expr = CommandExpr::cmd(["true"]).redirect_fd(7, Redirect::Null);
    let err = run(expr).await.expect_err("no such slot");
    assert!(matches!(err, ProcError::InvalidArgument(_)));
}
