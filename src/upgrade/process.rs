//! Waiting for the blocking application process to exit.
//!
//! The updater is started by the application it is about to replace. Before any
//! file is touched, that process must be gone: [`ProcessWaiter`] polls for it to
//! exit on its own for a bounded time and force-terminates it afterwards.
//!
//! The wait is race-tolerant rather than a strict synchronization primitive. A
//! process that is already gone, or that disappears between being found and being
//! killed, is simply treated as exited. The only failure is an operating system
//! refusing to terminate a process that is still running.

use crate::core::UpdateError;
use std::io;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Default time the process is given to exit on its own.
pub const DEFAULT_EXIT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default interval between liveness checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Default time to wait for a killed process to disappear.
pub const DEFAULT_KILL_SETTLE: Duration = Duration::from_secs(2);

/// Operating system access needed to wait for and terminate a process.
pub trait ProcessControl {
    /// Returns `true` while a process with this id exists and has not exited.
    fn is_running(&self, pid: u32) -> bool;

    /// Forcefully terminates the process.
    ///
    /// A process that no longer exists is not an error.
    fn terminate(&self, pid: u32) -> io::Result<()>;
}

/// [`ProcessControl`] backed by the host operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessControl;

#[cfg(unix)]
impl ProcessControl for SystemProcessControl {
    fn is_running(&self, pid: u32) -> bool {
        let Ok(raw_pid) = libc::pid_t::try_from(pid) else {
            return false;
        };

        let result = unsafe { libc::kill(raw_pid, 0) };
        if result == 0 {
            return !is_zombie(pid);
        }
        // EPERM means the process exists but belongs to someone else
        io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
    }

    fn terminate(&self, pid: u32) -> io::Result<()> {
        let raw_pid = libc::pid_t::try_from(pid)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, format!("pid {pid} is out of range")))?;

        let result = unsafe { libc::kill(raw_pid, libc::SIGKILL) };
        if result == 0 {
            return Ok(());
        }

        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            Some(libc::ESRCH) => Ok(()),
            _ => Err(err),
        }
    }
}

/// Exited but not yet reaped processes still answer `kill(pid, 0)`.
#[cfg(target_os = "linux")]
fn is_zombie(pid: u32) -> bool {
    let Ok(content) = std::fs::read_to_string(format!("/proc/{pid}/stat")) else {
        return false;
    };
    // Format: pid (comm) state ...
    content
        .rfind(')')
        .and_then(|comm_end| content.get(comm_end + 2..))
        .and_then(|rest| rest.chars().next())
        == Some('Z')
}

#[cfg(all(unix, not(target_os = "linux")))]
fn is_zombie(_pid: u32) -> bool {
    false
}

#[cfg(windows)]
impl ProcessControl for SystemProcessControl {
    fn is_running(&self, pid: u32) -> bool {
        let pid = sysinfo::Pid::from_u32(pid);
        let mut system = sysinfo::System::new();
        system.refresh_processes(sysinfo::ProcessesToUpdate::Some(&[pid]), true);
        system.process(pid).is_some()
    }

    fn terminate(&self, pid: u32) -> io::Result<()> {
        let sys_pid = sysinfo::Pid::from_u32(pid);
        let mut system = sysinfo::System::new();
        system.refresh_processes(sysinfo::ProcessesToUpdate::Some(&[sys_pid]), true);

        let Some(process) = system.process(sys_pid) else {
            return Ok(());
        };
        if process.kill() || !self.is_running(pid) {
            return Ok(());
        }
        Err(io::Error::other(format!("failed to terminate process {pid}")))
    }
}

/// How a [`ProcessWaiter::wait`] call concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// No process with the id existed when the wait started.
    NotRunning,
    /// The process exited on its own within the timeout.
    Exited,
    /// The process outlived the timeout and was force-terminated.
    Killed,
}

/// Waits for a process to exit, killing it if it does not exit in time.
///
/// # Examples
///
/// ```rust,no_run
/// use swap_updater::upgrade::process::ProcessWaiter;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), swap_updater::core::UpdateError> {
/// let waiter = ProcessWaiter::new(Duration::from_secs(10));
/// waiter.wait(4242)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ProcessWaiter<C = SystemProcessControl> {
    control: C,
    timeout: Duration,
    poll_interval: Duration,
    kill_settle: Duration,
}

impl ProcessWaiter {
    /// Create a waiter for the host operating system.
    pub fn new(timeout: Duration) -> Self {
        Self::with_control(SystemProcessControl, timeout)
    }
}

impl<C: ProcessControl> ProcessWaiter<C> {
    /// Create a waiter using a custom [`ProcessControl`].
    pub fn with_control(control: C, timeout: Duration) -> Self {
        Self {
            control,
            timeout,
            poll_interval: DEFAULT_POLL_INTERVAL,
            kill_settle: DEFAULT_KILL_SETTLE,
        }
    }

    /// Set the interval between liveness checks.
    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Set how long to wait for a killed process to disappear.
    pub fn kill_settle(mut self, kill_settle: Duration) -> Self {
        self.kill_settle = kill_settle;
        self
    }

    /// Block until process `pid` is gone.
    ///
    /// Returns immediately with [`WaitOutcome::NotRunning`] if no such process
    /// exists. Otherwise waits up to the configured timeout for it to exit and
    /// terminates it when it does not.
    ///
    /// # Errors
    ///
    /// [`UpdateError::CannotKillProcess`] if the process is still running after
    /// the timeout and the operating system refuses to terminate it.
    pub fn wait(&self, pid: u32) -> Result<WaitOutcome, UpdateError> {
        if !self.control.is_running(pid) {
            debug!("Process {pid} is not running");
            return Ok(WaitOutcome::NotRunning);
        }

        info!("Waiting up to {:?} for process {pid} to close...", self.timeout);
        if self.poll_until_gone(pid, self.timeout) {
            debug!("Process {pid} exited on its own");
            return Ok(WaitOutcome::Exited);
        }

        warn!("Process {pid} hasn't closed gracefully; killing it...");
        self.control
            .terminate(pid)
            .map_err(|source| UpdateError::CannotKillProcess { pid, source })?;

        if !self.poll_until_gone(pid, self.kill_settle) {
            warn!("Process {pid} is still visible {:?} after being killed", self.kill_settle);
        }
        Ok(WaitOutcome::Killed)
    }

    fn poll_until_gone(&self, pid: u32, budget: Duration) -> bool {
        let deadline = Instant::now() + budget;
        loop {
            if !self.control.is_running(pid) {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::sleep(self.poll_interval.min(deadline - now));
        }
    }
}
