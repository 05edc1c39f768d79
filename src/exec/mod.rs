//! Process orchestration: path resolution, single-command supervision,
//! two-stage pipelines and background bookkeeping.

pub mod child;
pub mod jobs;
pub mod pipeline;
pub mod resolve;
pub mod supervisor;

pub use jobs::BackgroundJobs;
pub use pipeline::{PipelineOutcome, run_pipeline};
pub use resolve::{Resolution, resolve, resolve_executable};
pub use supervisor::{SingleOutcome, run_single};

use log::debug;
use nix::errno::Errno;
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;

use crate::error::ShellError;

/// How a child terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Normal exit with this status code.
    Exited(i32),
    /// Killed by this signal number.
    Signaled(i32),
}

impl ExitStatus {
    pub fn success(self) -> bool {
        self == ExitStatus::Exited(0)
    }

    fn from_wait(status: WaitStatus) -> Option<Self> {
        match status {
            WaitStatus::Exited(_, code) => Some(ExitStatus::Exited(code)),
            WaitStatus::Signaled(_, signal, _) => Some(ExitStatus::Signaled(signal as i32)),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitStatus::Exited(code) => write!(f, "exit {code}"),
            ExitStatus::Signaled(signal) => write!(f, "signal {signal}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Running,
    Reaped(ExitStatus),
}

/// A child created by this shell.
///
/// Moves from `Running` to `Reaped` exactly once, when a wait targeting its
/// pid observes termination.
#[derive(Debug)]
pub struct ProcessHandle {
    pid: Pid,
    state: ProcessState,
}

impl ProcessHandle {
    pub(crate) fn new(pid: Pid) -> Self {
        Self {
            pid,
            state: ProcessState::Running,
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn exit_status(&self) -> Option<ExitStatus> {
        match self.state {
            ProcessState::Running => None,
            ProcessState::Reaped(status) => Some(status),
        }
    }

    /// Block until the child terminates.
    pub fn wait(&mut self) -> Result<ExitStatus, ShellError> {
        if let ProcessState::Reaped(status) = self.state {
            return Ok(status);
        }
        loop {
            match waitpid(self.pid, None) {
                Ok(ws) => {
                    if let Some(status) = ExitStatus::from_wait(ws) {
                        return Ok(self.mark_reaped(status));
                    }
                }
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(ShellError::os("waitpid")(e)),
            }
        }
    }

    /// Collect the child if it has already terminated, without blocking.
    pub fn try_reap(&mut self) -> Result<Option<ExitStatus>, ShellError> {
        if let ProcessState::Reaped(status) = self.state {
            return Ok(Some(status));
        }
        match waitpid(self.pid, Some(WaitPidFlag::WNOHANG)) {
            Ok(ws) => Ok(ExitStatus::from_wait(ws).map(|s| self.mark_reaped(s))),
            Err(Errno::EINTR) => Ok(None),
            Err(e) => Err(ShellError::os("waitpid")(e)),
        }
    }

    fn mark_reaped(&mut self, status: ExitStatus) -> ExitStatus {
        debug!("reaped pid {}: {status}", self.pid);
        self.state = ProcessState::Reaped(status);
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Environment;
    use crate::parse::ParsedCommand;

    fn env() -> Environment {
        Environment::from_pairs([("PATH", "/usr/bin:/bin")])
    }

    fn spawn_background(argv: &[&str]) -> ProcessHandle {
        let mut cmd = ParsedCommand::new(argv.iter().copied());
        cmd.background = true;
        match run_single(&cmd, &env()).unwrap() {
            SingleOutcome::Background(handle) => handle,
            other => panic!("expected background handle, got {other:?}"),
        }
    }

    #[test]
    fn wait_transitions_to_reaped_once() {
        let mut handle = spawn_background(&["true"]);
        assert_eq!(handle.state(), ProcessState::Running);
        let status = handle.wait().unwrap();
        assert!(status.success());
        assert_eq!(handle.state(), ProcessState::Reaped(status));
        // A second wait reports the recorded status instead of waiting again.
        assert_eq!(handle.wait().unwrap(), status);
    }

    #[test]
    fn try_reap_eventually_collects() {
        let mut handle = spawn_background(&["false"]);
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(10);
        let status = loop {
            if let Some(status) = handle.try_reap().unwrap() {
                break status;
            }
            assert!(std::time::Instant::now() < deadline, "child never exited");
            std::thread::sleep(std::time::Duration::from_millis(10));
        };
        assert_eq!(status, ExitStatus::Exited(1));
        assert_eq!(handle.exit_status(), Some(status));
    }

    #[test]
    fn exit_status_display() {
        assert_eq!(ExitStatus::Exited(3).to_string(), "exit 3");
        assert_eq!(ExitStatus::Signaled(9).to_string(), "signal 9");
        assert!(!ExitStatus::Exited(1).success());
    }
}
