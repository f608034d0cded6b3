use procpipe::{CommandExpr, CommandSpec, Redirect, SpawnFlags};

#[test]
fn display_single_quotes_awkward_args() {
    let spec = CommandSpec::new(["printf", "a b", "plain"]);
    assert_eq!(spec.to_string(), "printf 'a b' plain");
}

#[test]
fn display_renders_pipe_operators() {
    let expr = CommandExpr::cmd(["printf", "hello"]).pipe(CommandExpr::cmd(["wc", "-c"]));
    assert_eq!(expr.to_string(), "printf hello | wc -c");

    let expr = CommandExpr::cmd(["a"]).err_pipe(CommandExpr::cmd(["b"]));
    assert_eq!(expr.to_string(), "a .| b");

    let expr = CommandExpr::cmd(["a"]).and(CommandExpr::cmd(["b"]));
    assert_eq!(expr.to_string(), "a & b");
}

#[test]
fn display_renders_redirects() {
    let expr = CommandExpr::cmd(["make"]).redirect_fd(2, Redirect::file("/tmp/err.log"));
    assert_eq!(expr.to_string(), "make 2> /tmp/err.log");

    let expr = CommandExpr::cmd(["make"]).redirect_fd(1, Redirect::append("/tmp/out.log"));
    assert_eq!(expr.to_string(), "make 1> >>/tmp/out.log");
}

#[test]
fn first_spec_is_leftmost() {
    let expr = CommandExpr::cmd(["left"])
        .pipe(CommandExpr::cmd(["mid"]))
        .pipe(CommandExpr::cmd(["right"]))
        .redirect_fd(1, Redirect::Null);
    assert_eq!(expr.first_spec().to_string(), "left");
}

#[test]
fn spec_builder_accessors() {
    let spec = CommandSpec::new(["env"])
        .env([("KEY", "value")])
        .cwd("/tmp")
        .ignore_status(true);

    assert_eq!(spec.argv().len(), 1);
    let env = spec.get_env().expect("env set");
    assert_eq!(env.len(), 1);
    assert_eq!(env[0].0, "KEY");
    assert_eq!(spec.get_cwd().expect("cwd set").to_str(), Some("/tmp"));
    assert!(spec.ignores_status());
}

#[test]
fn spawn_flags_combine() {
    let flags = SpawnFlags::DETACHED | SpawnFlags::WINDOWS_HIDE;
    assert!(flags.contains(SpawnFlags::DETACHED));
    assert!(flags.contains(SpawnFlags::WINDOWS_HIDE));
    assert!(!flags.contains(SpawnFlags::WINDOWS_VERBATIM_ARGS));
    assert!(!SpawnFlags::empty().contains(SpawnFlags::DETACHED));
}
