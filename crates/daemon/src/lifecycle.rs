//! Start/stop/restart/status (spec.md §4.12), grounded directly on the
//! teacher's `crates/interfaces/cli/src/daemon.rs`: a fork-free supervised
//! child (`std::process::Command` re-exec of the same binary with an env
//! var marking it as the daemon process), `kill -0` liveness probing, and
//! `SIGTERM` escalating to `SIGKILL` on a timeout.

use std::fs;
use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use anyhow::{bail, Result};

use crate::paths::DaemonPaths;

/// Set on the re-exec'd child so `main` knows to run the Agent Loop
/// in-process instead of re-parsing CLI args.
pub const DAEMON_PROCESS_ENV: &str = "VIGIL_DAEMON_PROCESS";

pub fn read_pid(path: &Path) -> Result<Option<u32>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)?;
    Ok(raw.trim().parse::<u32>().ok())
}

pub fn is_pid_running(pid: u32) -> bool {
    #[cfg(unix)]
    {
        Command::new("kill")
            .arg("-0")
            .arg(pid.to_string())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }
    #[cfg(not(unix))]
    {
        let _ = pid;
        false
    }
}

fn send_signal(pid: u32, signal: &str) -> Result<()> {
    #[cfg(unix)]
    {
        let status = Command::new("kill").arg(signal).arg(pid.to_string()).status()?;
        if !status.success() {
            bail!("failed to send {signal} to pid {pid}");
        }
        Ok(())
    }
    #[cfg(not(unix))]
    {
        let _ = (pid, signal);
        bail!("daemon stop is only implemented on unix in this build")
    }
}

/// Best-effort cleanup of any short-lived children the daemon spawned
/// (e.g. a `signal-cli` invocation still in flight); this core's only
/// long-running process is the daemon itself, so this is a courtesy, not
/// load-bearing for correctness.
fn terminate_children(pid: u32) {
    #[cfg(unix)]
    {
        let _ = Command::new("pkill").arg("-TERM").arg("-P").arg(pid.to_string()).status();
    }
    #[cfg(not(unix))]
    {
        let _ = pid;
    }
}

pub fn wait_for_pid_exit(pid: u32, timeout: Duration) -> bool {
    let step = Duration::from_millis(100);
    let mut waited = Duration::from_millis(0);
    while waited < timeout {
        if !is_pid_running(pid) {
            return true;
        }
        std::thread::sleep(step);
        waited += step;
    }
    !is_pid_running(pid)
}

/// Start. Refuses if the PID file references a live process (unless
/// `force`); otherwise re-execs the current binary as the supervised
/// child, reattaching its stdio to `log_file`.
pub fn daemon_start(paths: &DaemonPaths, force: bool) -> Result<()> {
    if let Some(pid) = read_pid(&paths.pid_file)? {
        if is_pid_running(pid) {
            if !force {
                bail!("daemon already running with pid {pid}; use `vigil restart` or `vigil start --force`");
            }
            send_signal(pid, "-TERM").ok();
            wait_for_pid_exit(pid, Duration::from_secs(10));
        }
        let _ = fs::remove_file(&paths.pid_file);
    }

    if let Some(parent) = paths.pid_file.parent() {
        fs::create_dir_all(parent)?;
    }
    if let Some(parent) = paths.log_file.parent() {
        fs::create_dir_all(parent)?;
    }

    let exe = std::env::current_exe()?;
    let out = OpenOptions::new().create(true).append(true).open(&paths.log_file)?;
    let err = out.try_clone()?;

    let child = Command::new(exe)
        .arg("foreground")
        .arg("--platform")
        .arg(&paths.platform)
        .env(DAEMON_PROCESS_ENV, "1")
        .stdin(Stdio::null())
        .stdout(Stdio::from(out))
        .stderr(Stdio::from(err))
        .spawn()?;

    fs::write(&paths.pid_file, child.id().to_string())?;
    println!("daemon started");
    println!("- pid: {}", child.id());
    println!("- log: {}", paths.log_file.display());
    Ok(())
}

/// Stop. SIGTERM, wait up to 10s polling `kill -0`; escalate to SIGKILL,
/// wait up to 5s; clean up any stray children and the PID file.
pub fn daemon_stop(paths: &DaemonPaths) -> Result<()> {
    let Some(pid) = read_pid(&paths.pid_file)? else {
        println!("daemon is not running");
        return Ok(());
    };

    if !is_pid_running(pid) {
        let _ = fs::remove_file(&paths.pid_file);
        println!("daemon was not running (stale pid file cleaned)");
        return Ok(());
    }

    send_signal(pid, "-TERM")?;
    if !wait_for_pid_exit(pid, Duration::from_secs(10)) {
        send_signal(pid, "-KILL")?;
        if !wait_for_pid_exit(pid, Duration::from_secs(5)) {
            bail!("daemon pid {pid} still alive after SIGKILL");
        }
    }
    terminate_children(pid);
    let _ = fs::remove_file(&paths.pid_file);
    println!("daemon stopped (pid {pid})");
    Ok(())
}

pub fn daemon_restart(paths: &DaemonPaths, force: bool) -> Result<()> {
    daemon_stop(paths)?;
    daemon_start(paths, force)
}

pub fn daemon_status(paths: &DaemonPaths) -> Result<()> {
    match read_pid(&paths.pid_file)? {
        Some(pid) if is_pid_running(pid) => {
            println!("daemon status: running");
            println!("- pid: {pid}");
            println!("- platform: {}", paths.platform);
            println!("- log: {}", paths.log_file.display());
        }
        Some(pid) => {
            println!("daemon status: stopped (stale pid file for {pid})");
            let _ = fs::remove_file(&paths.pid_file);
        }
        None => {
            println!("daemon status: stopped");
        }
    }
    Ok(())
}

/// True when stdin/stdout are both attached to a terminal; `foreground`
/// uses this only for a friendlier startup message, never for behavior.
pub fn is_interactive_terminal() -> bool {
    std::io::stdin().is_terminal() && std::io::stdout().is_terminal()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_pid_returns_none_for_missing_file() {
        assert!(read_pid(Path::new("/nonexistent/pidfile")).unwrap().is_none());
    }

    #[test]
    fn read_pid_parses_trimmed_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vigil.pid");
        fs::write(&path, "4242\n").unwrap();
        assert_eq!(read_pid(&path).unwrap(), Some(4242));
    }

    #[test]
    fn is_pid_running_is_false_for_an_implausible_pid() {
        assert!(!is_pid_running(u32::MAX));
    }
}
