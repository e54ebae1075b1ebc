use models::Registry;

use std::thread::sleep;
use std::time::Duration;

use backoff::{ExponentialBackoff, backoff::Backoff};
use log::{debug, info, trace};
use sysinfo::{
    Pid, Process, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, Signal, System, UpdateKind,
};

const KILL_VERIFY_MAX_ELAPSED: Duration = Duration::from_secs(5);

/// Snapshot of the process table used to decide which registry entries are live.
///
/// One snapshot serves a whole sweep so every entry is judged against the
/// same view of the system.
pub struct LivenessChecker {
    system: System,
}

impl LivenessChecker {
    pub fn new() -> Self {
        let mut checker = Self {
            system: System::new(),
        };
        checker.refresh();
        checker
    }

    pub fn refresh(&mut self) {
        self.system.refresh_processes(ProcessesToUpdate::All, true);
        trace!("Process snapshot holds {} processes", self.system.processes().len());
    }

    /// A pid is alive if it exists and is not a zombie. Pid 0 never is.
    pub fn is_alive(&self, pid: u32) -> bool {
        pid != 0
            && self
                .system
                .process(Pid::from_u32(pid))
                .is_some_and(is_running)
    }

    /// Copy of `registry` without entries whose process has exited.
    pub fn sweep(&self, registry: &Registry) -> Registry {
        let mut swept = registry.clone();
        swept.retain(|entry| {
            let alive = self.is_alive(entry.pid);
            if !alive {
                info!(
                    "Sweeping stale entry {} (PID {}, port {})",
                    entry.project_name, entry.pid, entry.port
                );
            }
            alive
        });
        swept
    }
}

impl Default for LivenessChecker {
    fn default() -> Self {
        Self::new()
    }
}

fn is_running(process: &Process) -> bool {
    !matches!(process.status(), ProcessStatus::Zombie | ProcessStatus::Dead)
}

/// One-off liveness check for a single pid.
pub fn is_alive(pid: u32) -> bool {
    if pid == 0 {
        return false;
    }
    let sys_pid = Pid::from_u32(pid);
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[sys_pid]), true);
    sys.process(sys_pid).is_some_and(is_running)
}

pub(crate) fn with_process<F, R>(pid: u32, f: F) -> Option<R>
where
    F: FnOnce(&Process) -> R,
{
    let sys_pid = Pid::from_u32(pid);
    let mut sys = System::new();
    sys.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[sys_pid]),
        true,
        ProcessRefreshKind::nothing().with_cmd(UpdateKind::OnlyIfNotSet),
    );

    sys.process(sys_pid).filter(|p| is_running(p)).map(f)
}

pub(crate) fn format_command(process: &Process) -> String {
    let cmd_vec: Vec<String> = process
        .cmd()
        .iter()
        .map(|s| s.to_string_lossy().to_string())
        .collect();

    if cmd_vec.is_empty() {
        String::new()
    } else {
        cmd_vec.join(" ")
    }
}

/// Stop a process by PID.
///
/// Attempts graceful termination (SIGTERM) first, falls back to force kill (SIGKILL).
/// Uses exponential backoff to verify the process has terminated, waiting up to 5 seconds.
/// Never signals PID 0, PID 1 or the calling process.
///
/// # Returns
///
/// * `true` - If the process was successfully terminated
/// * `false` - If the process doesn't exist, is protected, or couldn't be killed
pub fn stop_pid(pid: u32) -> bool {
    if pid <= 1 || pid == std::process::id() {
        debug!("Refusing to stop protected PID {pid}");
        return false;
    }

    let killed = with_process(pid, |p| {
        if let Some(sent) = p.kill_with(Signal::Term) {
            debug!("Sent SIGTERM to PID {pid}: success={sent}");
            sent
        } else {
            let killed = p.kill();
            debug!("Sent SIGKILL to PID {pid}: success={killed}");
            killed
        }
    })
    .unwrap_or_else(|| {
        debug!("Process {pid} not found");
        false
    });

    if !killed {
        return false;
    }

    let mut backoff = ExponentialBackoff {
        max_elapsed_time: Some(KILL_VERIFY_MAX_ELAPSED),
        ..Default::default()
    };

    loop {
        if !is_alive(pid) {
            debug!("Process {pid} successfully terminated");
            return true;
        }

        match backoff.next_backoff() {
            Some(duration) => {
                trace!("Process {pid} still alive, retrying after {duration:?}");
                sleep(duration);
            }
            None => {
                debug!("Process {pid} still running after max backoff time");
                return false;
            }
        }
    }
}
