//! Liveness checks and lifecycle control for backend daemons
//!
//! `ProcessControl` is the raw OS capability (lookup, launch, signal);
//! `Supervisor` layers the idempotence and reload rules on top of it.
//! Checks are advisory: a daemon may start or exit between check and use.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::constants::{daemons, paths};
use crate::error::{SettingsError, SettingsResult};

pub trait ProcessControl {
    /// Executable reachable by name
    fn is_installed(&self, name: &str) -> bool;

    /// At least one process with exactly this name exists
    fn is_running(&self, name: &str) -> bool;

    /// Run `name` with `args`; the daemon is expected to background itself
    fn launch(&self, name: &str, args: &[String]) -> io::Result<()>;

    /// SIGTERM every process named `name`
    fn terminate(&self, name: &str) -> io::Result<()>;

    /// SIGUSR1 every process named `name`
    fn signal_reload(&self, name: &str) -> io::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadStrategy {
    /// Daemon re-reads its config on a signal
    Signal,
    /// No reload primitive: stop, wait, start
    Restart,
    /// Changes take effect on next read; nothing to notify
    None,
}

/// Process inspection backed by `/proc` and `PATH`
#[derive(Debug, Clone)]
pub struct SystemProcesses {
    proc_root: PathBuf,
}

impl Default for SystemProcesses {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from(paths::PROC),
        }
    }
}

impl SystemProcesses {
    pub fn new() -> Self {
        Self::default()
    }

    /// PIDs whose `comm` equals the base name of `name` (after kernel truncation)
    fn pids_named(&self, name: &str) -> Vec<i32> {
        let wanted = comm_name(name);
        let entries = match fs::read_dir(&self.proc_root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.proc_root.display(), error = %e, "Cannot scan process table");
                return Vec::new();
            }
        };

        entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let pid: i32 = entry.file_name().to_str()?.parse().ok()?;
                let comm = fs::read_to_string(entry.path().join("comm")).ok()?;
                (comm.trim_end() == wanted).then_some(pid)
            })
            .collect()
    }

    fn signal_all(&self, name: &str, signal: Signal) -> io::Result<()> {
        let pids = self.pids_named(name);
        debug!(name, ?pids, ?signal, "Signalling processes");
        for pid in pids {
            send_signal(pid, signal)?;
        }
        Ok(())
    }
}

/// What the kernel reports in `comm` for a process started as `name`
fn comm_name(name: &str) -> &str {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(name);
    truncate_comm(base)
}

fn truncate_comm(name: &str) -> &str {
    if name.len() <= daemons::COMM_MAX_LEN {
        return name;
    }
    let mut end = daemons::COMM_MAX_LEN;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Terminate,
    Reload,
}

#[cfg(unix)]
fn send_signal(pid: i32, signal: Signal) -> io::Result<()> {
    use nix::sys::signal::{kill, Signal as NixSignal};
    use nix::unistd::Pid;

    let sig = match signal {
        Signal::Terminate => NixSignal::SIGTERM,
        Signal::Reload => NixSignal::SIGUSR1,
    };
    match kill(Pid::from_raw(pid), sig) {
        Ok(()) => Ok(()),
        // Exited between scan and signal
        Err(nix::errno::Errno::ESRCH) => Ok(()),
        Err(e) => Err(io::Error::from(e)),
    }
}

#[cfg(not(unix))]
fn send_signal(_pid: i32, _signal: Signal) -> io::Result<()> {
    Err(io::Error::new(io::ErrorKind::Unsupported, "signals need a unix host"))
}

impl ProcessControl for SystemProcesses {
    fn is_installed(&self, name: &str) -> bool {
        which::which(name).is_ok()
    }

    fn is_running(&self, name: &str) -> bool {
        !self.pids_named(name).is_empty()
    }

    fn launch(&self, name: &str, args: &[String]) -> io::Result<()> {
        let status = Command::new(name)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()?;
        if status.success() {
            Ok(())
        } else {
            Err(io::Error::other(format!("{name} exited with {status}")))
        }
    }

    fn terminate(&self, name: &str) -> io::Result<()> {
        self.signal_all(name, Signal::Terminate)
    }

    fn signal_reload(&self, name: &str) -> io::Result<()> {
        self.signal_all(name, Signal::Reload)
    }
}

/// Lifecycle rules shared by every daemon-backed backend
pub struct Supervisor<'a> {
    control: &'a dyn ProcessControl,
    settle: Duration,
}

impl<'a> Supervisor<'a> {
    pub fn new(control: &'a dyn ProcessControl, settle: Duration) -> Self {
        Self { control, settle }
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.control.is_running(name)
    }

    /// Start `name` unless it is already running
    pub fn start(&self, name: &str, args: &[String]) -> SettingsResult<()> {
        if self.control.is_running(name) {
            debug!(daemon = name, "Already running");
            return Ok(());
        }
        if !self.control.is_installed(name) {
            return Err(SettingsError::ProcessOpFailed {
                daemon: name.to_string(),
                op: "start",
                reason: format!("{name} is not installed (install with: sudo apt install {name})"),
            });
        }

        self.control
            .launch(name, args)
            .map_err(|e| process_failed(name, "start", e))?;
        info!(daemon = name, ?args, "Started daemon");
        Ok(())
    }

    /// Stop `name`; stopping a stopped daemon succeeds
    pub fn stop(&self, name: &str) -> SettingsResult<()> {
        if !self.control.is_running(name) {
            debug!(daemon = name, "Already stopped");
            return Ok(());
        }
        self.control
            .terminate(name)
            .map_err(|e| process_failed(name, "stop", e))?;
        info!(daemon = name, "Stopped daemon");
        Ok(())
    }

    /// Apply a config change to a running daemon. Stopped daemons pick the
    /// change up on their next start.
    pub fn reload(&self, name: &str, strategy: ReloadStrategy, start_args: &[String]) -> SettingsResult<()> {
        if strategy == ReloadStrategy::None || !self.control.is_running(name) {
            return Ok(());
        }

        match strategy {
            ReloadStrategy::Signal => {
                self.control
                    .signal_reload(name)
                    .map_err(|e| process_failed(name, "reload", e))?;
                info!(daemon = name, "Sent reload signal");
            }
            ReloadStrategy::Restart => {
                self.stop(name)?;
                thread::sleep(self.settle);
                self.start(name, start_args)?;
                info!(daemon = name, "Restarted daemon to reload config");
            }
            ReloadStrategy::None => {}
        }
        Ok(())
    }
}

fn process_failed(name: &str, op: &'static str, err: io::Error) -> SettingsError {
    warn!(daemon = name, op, error = %err, "Process operation failed");
    SettingsError::ProcessOpFailed {
        daemon: name.to_string(),
        op,
        reason: err.to_string(),
    }
}

#[cfg(test)]
pub use fake::FakeProcesses;


#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> Vec<String> {
        vec!["-b".to_string()]
    }

    #[test]
    fn test_start_is_idempotent() {
        let procs = FakeProcesses::new().installed("picom").running("picom");
        let sup = Supervisor::new(&procs, Duration::ZERO);
        sup.start("picom", &args()).unwrap();
        assert!(procs.calls().is_empty());
    }

    #[test]
    fn test_start_launches_once() {
        let procs = FakeProcesses::new().installed("picom");
        let sup = Supervisor::new(&procs, Duration::ZERO);
        sup.start("picom", &args()).unwrap();
        sup.start("picom", &args()).unwrap();
        assert_eq!(procs.calls(), vec!["launch picom -b"]);
    }

    #[test]
    fn test_start_requires_installed_binary() {
        let procs = FakeProcesses::new();
        let sup = Supervisor::new(&procs, Duration::ZERO);
        let err = sup.start("picom", &args()).unwrap_err();
        assert!(matches!(err, SettingsError::ProcessOpFailed { op: "start", .. }));
        assert!(procs.calls().is_empty());
    }

    #[test]
    fn test_launch_failure_is_reported_not_retried() {
        let procs = FakeProcesses::new().installed("picom").failing_launch();
        let sup = Supervisor::new(&procs, Duration::ZERO);
        assert!(sup.start("picom", &args()).is_err());
        assert_eq!(procs.count("launch"), 1);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let procs = FakeProcesses::new().installed("picom");
        let sup = Supervisor::new(&procs, Duration::ZERO);
        sup.stop("picom").unwrap();
        assert!(procs.calls().is_empty());
    }

    #[test]
    fn test_restart_reload_stops_then_starts() {
        let procs = FakeProcesses::new().installed("picom").running("picom");
        let sup = Supervisor::new(&procs, Duration::ZERO);
        sup.reload("picom", ReloadStrategy::Restart, &args()).unwrap();
        assert_eq!(procs.calls(), vec!["terminate picom", "launch picom -b"]);
    }

    #[test]
    fn test_signal_reload_only_when_running() {
        let procs = FakeProcesses::new().installed("tint2");
        let sup = Supervisor::new(&procs, Duration::ZERO);
        sup.reload("tint2", ReloadStrategy::Signal, &[]).unwrap();
        assert!(procs.calls().is_empty());

        let procs = FakeProcesses::new().installed("tint2").running("tint2");
        let sup = Supervisor::new(&procs, Duration::ZERO);
        sup.reload("tint2", ReloadStrategy::Signal, &[]).unwrap();
        assert_eq!(procs.calls(), vec!["signal tint2"]);
    }

    #[test]
    fn test_truncate_comm_matches_kernel_limit() {
        assert_eq!(truncate_comm("picom"), "picom");
        assert_eq!(truncate_comm("a-very-long-daemon-name"), "a-very-long-dae");
    }

    #[test]
    fn test_system_scan_reads_comm_files() {
        let dir = tempfile::tempdir().unwrap();
        for (pid, comm) in [("12", "picom\n"), ("40", "tint2\n"), ("self", "picom\n")] {
            let p = dir.path().join(pid);
            fs::create_dir(&p).unwrap();
            fs::write(p.join("comm"), comm).unwrap();
        }
        let procs = SystemProcesses {
            proc_root: dir.path().to_path_buf(),
        };
        assert_eq!(procs.pids_named("picom"), vec![12]);
        assert!(procs.is_running("tint2"));
        assert!(!procs.is_running("xcompmgr"));
    }

    #[test]
    fn test_configured_binary_path_matches_base_name() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("77");
        fs::create_dir(&p).unwrap();
        fs::write(p.join("comm"), "picom\n").unwrap();
        let procs = SystemProcesses {
            proc_root: dir.path().to_path_buf(),
        };

        assert!(procs.is_running("picom"));
        assert!(procs.is_running("/usr/bin/picom"));
        assert_eq!(procs.pids_named("/opt/picom/bin/picom"), vec![77]);
        assert!(!procs.is_running("/usr/bin/tint2"));
        assert_eq!(comm_name("/usr/local/bin/a-very-long-daemon-name"), "a-very-long-dae");
    }

    #[test]
    fn test_installed_accepts_explicit_executable_path() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("picom");
        fs::write(&bin, "#!/bin/sh\n").unwrap();

        let procs = SystemProcesses::new();
        assert!(!procs.is_installed(bin.to_str().unwrap()));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&bin, fs::Permissions::from_mode(0o755)).unwrap();
            assert!(procs.is_installed(bin.to_str().unwrap()));
        }
    }
}
