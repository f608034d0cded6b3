// src/main.rs

use anyhow::{anyhow, bail, Result};

use procpipe::{
    cli::{self, CliArgs},
    logging, read, run, CommandExpr, CommandSpec, ProcError, Redirect,
};

#[tokio::main]
async fn main() {
    let args = cli::parse();
    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("procpipe error: {err:?}");
        std::process::exit(1);
    }
    match run_main(args).await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("procpipe error: {err:?}");
            std::process::exit(1);
        }
    }
}

async fn run_main(args: CliArgs) -> Result<i32> {
    let expr = build_expr(&args)?;

    if args.capture {
        match read(expr).await {
            Ok(bytes) => {
                use std::io::Write;
                std::io::stdout().write_all(&bytes)?;
                Ok(0)
            }
            Err(err) => exit_code_for(err),
        }
    } else {
        match run(expr).await {
            Ok(_) => Ok(0),
            Err(err) => exit_code_for(err),
        }
    }
}

/// Turn a failed-process error into the shell-style exit code of the
/// first failure; other errors propagate.
fn exit_code_for(err: ProcError) -> Result<i32> {
    match err {
        ProcError::Failed(failed) => {
            let first = failed.first().ok_or_else(|| anyhow!("empty failure list"))?;
            if first.term_signal > 0 {
                Ok(128 + first.term_signal)
            } else {
                Ok(first.exit_code as i32)
            }
        }
        other => Err(other.into()),
    }
}

/// Build the command expression from the CLI arguments.
fn build_expr(args: &CliArgs) -> Result<CommandExpr> {
    let mut segments: Vec<Vec<String>> = vec![Vec::new()];
    for word in &args.command {
        if word == "|" {
            segments.push(Vec::new());
        } else {
            segments
                .last_mut()
                .ok_or_else(|| anyhow!("no command segment"))?
                .push(word.clone());
        }
    }

    let env = parse_env(&args.env)?;
    let mut expr: Option<CommandExpr> = None;
    for segment in segments {
        if segment.is_empty() {
            bail!("empty command segment around '|'");
        }
        let mut spec = CommandSpec::new(segment);
        if let Some(cwd) = &args.cwd {
            spec = spec.cwd(cwd);
        }
        if let Some(env) = &env {
            spec = spec.env(env.clone());
        }
        let single = CommandExpr::Single(spec);
        expr = Some(match expr {
            Some(prev) => prev.pipe(single),
            None => single,
        });
    }
    let mut expr = expr.ok_or_else(|| anyhow!("no command given"))?;

    if let Some(path) = &args.stdin {
        expr = expr.redirect_fd(0, Redirect::file(path));
    }
    if let Some(path) = &args.stdout {
        expr = expr.redirect_fd(1, out_redirect(path, args.append));
    }
    if let Some(path) = &args.stderr {
        expr = expr.redirect_fd(2, out_redirect(path, args.append));
    }
    Ok(expr)
}

fn out_redirect(path: &str, append: bool) -> Redirect {
    if append {
        Redirect::append(path)
    } else {
        Redirect::file(path)
    }
}

fn parse_env(entries: &[String]) -> Result<Option<Vec<(String, String)>>> {
    if entries.is_empty() {
        return Ok(None);
    }
    let mut env = Vec::with_capacity(entries.len());
    for entry in entries {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| anyhow!("invalid --env entry '{entry}' (expected KEY=VALUE)"))?;
        env.push((key.to_string(), value.to_string()));
    }
    Ok(Some(env))
}
