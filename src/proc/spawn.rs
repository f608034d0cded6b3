// src/proc/spawn.rs

//! Single-command spawn.

use std::sync::Arc;

use tokio::process::Command;
use tracing::info;

use crate::cmd::{CommandSpec, SpawnFlags};
use crate::errors::{ProcError, Result};
use crate::proc::process::{register_reaper, Process};
use crate::stdio::redirect::SlotValue;

/// Spawn one command with the given resolved stdio slots.
///
/// On success the returned process is already registered with its reaper
/// task, so the exit notification cannot be missed no matter how fast the
/// child exits. On failure every descriptor owned by the slots is closed
/// by the caller dropping them; nothing leaks.
pub(crate) fn spawn_one(spec: &CommandSpec, slots: &[SlotValue; 3]) -> Result<Arc<Process>> {
    let argv = spec.argv();
    if argv.is_empty() {
        return Err(ProcError::InvalidArgument("empty argv".into()));
    }

    let mut cmd = Command::new(&argv[0]);
    cmd.args(&argv[1..]);

    if let Some(env) = spec.get_env() {
        cmd.env_clear();
        cmd.envs(env.iter().map(|(k, v)| (k.as_os_str(), v.as_os_str())));
    }
    if let Some(cwd) = spec.get_cwd() {
        cmd.current_dir(cwd);
    }

    cmd.stdin(slots[0].to_stdio()?);
    cmd.stdout(slots[1].to_stdio()?);
    cmd.stderr(slots[2].to_stdio()?);

    #[cfg(unix)]
    apply_unix_options(cmd.as_std_mut(), spec);

    let child = cmd.spawn().map_err(|err| ProcError::Spawn {
        cmd: spec.to_string(),
        source: err,
    })?;

    // id() is Some for any child that has not been reaped; we have not
    // awaited it yet.
    let pid = child.id().unwrap_or(0);

    let sync_tasks = slots.iter().filter_map(|slot| slot.forwarder()).collect();
    let process = Process::new(spec.clone(), pid, sync_tasks);
    register_reaper(&process, child);

    info!(cmd = %spec, pid, "spawned process");
    Ok(process)
}

#[cfg(unix)]
fn apply_unix_options(cmd: &mut std::process::Command, spec: &CommandSpec) {
    use std::os::unix::process::CommandExt;

    let detached = spec.get_flags().contains(SpawnFlags::DETACHED);
    let cpumask = spec.get_cpumask().map(<[bool]>::to_vec);

    if !detached && cpumask.is_none() {
        return;
    }

    unsafe {
        cmd.pre_exec(move || {
            if detached {
                nix::unistd::setsid().map_err(std::io::Error::from)?;
            }
            if let Some(mask) = &cpumask {
                set_affinity(mask)?;
            }
            Ok(())
        });
    }
}

#[cfg(unix)]
fn set_affinity(mask: &[bool]) -> std::io::Result<()> {
    use nix::sched::{sched_setaffinity, CpuSet};
    use nix::unistd::Pid;

    let mut set = CpuSet::new();
    for (cpu, enabled) in mask.iter().enumerate() {
        if *enabled {
            set.set(cpu).map_err(std::io::Error::from)?;
        }
    }
    sched_setaffinity(Pid::from_raw(0), &set).map_err(std::io::Error::from)?;
    Ok(())
}
