use std::os::fd::{AsRawFd, OwnedFd, RawFd};

use log::{debug, warn};
#[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))]
use nix::{fcntl::OFlag, unistd::pipe2};

use super::child::{ChildPlan, spawn};
use super::resolve::resolve_executable;
use super::{ExitStatus, ProcessHandle};
use crate::env::Environment;
use crate::error::ShellError;
use crate::parse::PipelineSpec;

/// Statuses of every stage, in data-flow order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutcome {
    pub statuses: Vec<ExitStatus>,
}

impl PipelineOutcome {
    /// Status of the last stage, which is what the line reports.
    pub fn last(&self) -> Option<ExitStatus> {
        self.statuses.last().copied()
    }
}

/// Run `stage_a | stage_b`.
///
/// Both executables are resolved before anything is forked, so an unknown
/// command on either side creates no process at all. The shell keeps no
/// pipe end open once the children exist, which lets the reader see EOF as
/// soon as the writer exits.
pub fn run_pipeline(spec: &PipelineSpec, env: &Environment) -> Result<PipelineOutcome, ShellError> {
    run_stages(&spec.stages(), env)
}

/// A pipe whose ends are not inherited across `execve`. Children re-install
/// the ends they need with `dup2`, which clears the flag on the copy.
#[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))]
fn cloexec_pipe() -> Result<(OwnedFd, OwnedFd), ShellError> {
    pipe2(OFlag::O_CLOEXEC).map_err(ShellError::os("pipe2"))
}

#[cfg(not(any(target_os = "linux", target_os = "android", target_os = "freebsd")))]
fn cloexec_pipe() -> Result<(OwnedFd, OwnedFd), ShellError> {
    use nix::fcntl::{FcntlArg, FdFlag, fcntl};
    let (read, write) = nix::unistd::pipe().map_err(ShellError::os("pipe"))?;
    for fd in [&read, &write] {
        fcntl(fd.as_raw_fd(), FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC))
            .map_err(ShellError::os("fcntl"))?;
    }
    Ok((read, write))
}

/// Wire `stages` together with one pipe between each neighbouring pair.
fn run_stages(stages: &[&[String]], env: &Environment) -> Result<PipelineOutcome, ShellError> {
    let mut plans = Vec::with_capacity(stages.len());
    for argv in stages {
        let name = argv.first().map(String::as_str).unwrap_or_default();
        let path = resolve_executable(name, env)?;
        plans.push(ChildPlan::new(&path, argv, env)?);
    }

    let mut pipes = Vec::with_capacity(stages.len().saturating_sub(1));
    for _ in 1..stages.len() {
        pipes.push(cloexec_pipe()?);
    }
    let all_fds: Vec<RawFd> = pipes
        .iter()
        .flat_map(|(r, w)| [r.as_raw_fd(), w.as_raw_fd()])
        .collect();

    for (i, plan) in plans.iter_mut().enumerate() {
        if i > 0 {
            plan.stdin_from_fd(pipes[i - 1].0.as_raw_fd());
        }
        if let Some((_, write)) = pipes.get(i) {
            plan.stdout_to_fd(write.as_raw_fd());
        }
        plan.close_after_setup(all_fds.iter().copied());
    }

    let mut handles: Vec<ProcessHandle> = Vec::with_capacity(plans.len());
    let mut spawn_error = None;
    for plan in plans {
        match spawn(plan) {
            Ok(handle) => handles.push(handle),
            Err(e) => {
                spawn_error = Some(e);
                break;
            }
        }
    }

    // Every child holds its own copies now.
    drop(pipes);

    let mut statuses = Vec::with_capacity(handles.len());
    for handle in &mut handles {
        statuses.push(handle.wait()?);
    }

    if let Some(e) = spawn_error {
        warn!("pipeline aborted after {} of {} stages: {e}", handles.len(), stages.len());
        return Err(e);
    }
    debug!("pipeline finished: {statuses:?}");
    Ok(PipelineOutcome { statuses })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{Duration, Instant};

    fn env() -> Environment {
        Environment::from_pairs([("PATH", "/usr/bin:/bin")])
    }

    fn spec(a: &[&str], b: &[&str]) -> PipelineSpec {
        PipelineSpec {
            stage_a: a.iter().map(|s| s.to_string()).collect(),
            stage_b: b.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn data_flows_from_first_stage_to_second() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        let out = dir.path().join("out.txt");
        fs::write(&input, "x\ny\n").unwrap();
        let script = format!("wc -l > {}", out.display());
        let outcome = run_pipeline(
            &spec(&["cat", &input.display().to_string()], &["sh", "-c", &script]),
            &env(),
        )
        .unwrap();
        assert_eq!(outcome.statuses.len(), 2);
        assert!(outcome.statuses.iter().all(|s| s.success()));
        assert_eq!(fs::read_to_string(&out).unwrap().trim(), "2");
    }

    #[test]
    fn reader_sees_eof_when_writer_exits() {
        // `cat` only terminates once every write end is closed.
        let started = Instant::now();
        let outcome = run_pipeline(&spec(&["true"], &["cat"]), &env()).unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(outcome.last(), Some(ExitStatus::Exited(0)));
    }

    #[test]
    fn statuses_are_in_stage_order() {
        let outcome = run_pipeline(&spec(&["false"], &["true"]), &env()).unwrap();
        assert_eq!(
            outcome.statuses,
            vec![ExitStatus::Exited(1), ExitStatus::Exited(0)]
        );
    }

    #[test]
    fn unknown_first_stage_spawns_nothing() {
        let err = run_pipeline(&spec(&["nosuchcmd123"], &["cat"]), &env()).unwrap_err();
        assert!(matches!(err, ShellError::Resolution { ref name } if name == "nosuchcmd123"));
    }

    #[test]
    fn unknown_second_stage_spawns_nothing() {
        // If `cat` were started here it would block forever on an open pipe.
        let err = run_pipeline(&spec(&["cat"], &["nosuchcmd123"]), &env()).unwrap_err();
        assert!(matches!(err, ShellError::Resolution { .. }));
    }

    #[test]
    fn writer_is_terminated_when_reader_exits_early() {
        let outcome = run_pipeline(&spec(&["yes"], &["head", "-n", "1"]), &env()).unwrap();
        assert_eq!(outcome.statuses[1], ExitStatus::Exited(0));
        // SIGPIPE is restored to its default disposition in children.
        assert_eq!(outcome.statuses[0], ExitStatus::Signaled(13));
    }

    #[test]
    fn three_stage_wiring() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        let script = format!("cat > {}", out.display());
        let a: Vec<String> = ["printf", "b\\na\\n"].iter().map(|s| s.to_string()).collect();
        let b: Vec<String> = vec!["sort".into()];
        let c: Vec<String> = ["sh", "-c", &script].iter().map(|s| s.to_string()).collect();
        let outcome = run_stages(&[a.as_slice(), b.as_slice(), c.as_slice()], &env()).unwrap();
        assert_eq!(outcome.statuses.len(), 3);
        assert_eq!(fs::read_to_string(&out).unwrap(), "a\nb\n");
    }
}
