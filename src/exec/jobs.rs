use log::{debug, warn};
use nix::unistd::Pid;

use super::{ExitStatus, ProcessHandle};

/// Children started with the background marker and not yet collected.
///
/// Reaping always targets a specific pid with `WNOHANG`; a wildcard wait
/// could steal a foreground child's status.
#[derive(Debug, Default)]
pub struct BackgroundJobs {
    handles: Vec<ProcessHandle>,
}

impl BackgroundJobs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, handle: ProcessHandle) {
        self.handles.push(handle);
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn pids(&self) -> impl Iterator<Item = Pid> + '_ {
        self.handles.iter().map(ProcessHandle::pid)
    }

    /// Collect every background child that has already exited.
    pub fn reap_finished(&mut self) -> Vec<(Pid, ExitStatus)> {
        let mut finished = Vec::new();
        self.handles.retain_mut(|handle| match handle.try_reap() {
            Ok(Some(status)) => {
                debug!("[{}] done: {status}", handle.pid());
                finished.push((handle.pid(), status));
                false
            }
            Ok(None) => true,
            Err(e) => {
                // ECHILD: someone else collected it; nothing left to track.
                warn!("[{}] dropped from background jobs: {e}", handle.pid());
                false
            }
        });
        finished
    }
}
