use log::{debug, info};

use super::child::{ChildPlan, spawn};
use super::resolve::resolve_executable;
use super::{ExitStatus, ProcessHandle};
use crate::env::Environment;
use crate::error::ShellError;
use crate::parse::ParsedCommand;

/// Result of running one command.
#[derive(Debug)]
pub enum SingleOutcome {
    /// argv was empty; no process was created.
    Skipped,
    /// The command ran in the foreground and was waited for.
    Foreground(ExitStatus),
    /// The command was started in the background and not waited for.
    Background(ProcessHandle),
}

/// Run one command with optional redirection.
///
/// Resolution and permission problems are reported before any process
/// exists. Redirection targets are opened inside the child; if that fails
/// the child exits with [`super::child::REDIRECT_FAILED`].
pub fn run_single(cmd: &ParsedCommand, env: &Environment) -> Result<SingleOutcome, ShellError> {
    let Some(name) = cmd.name() else {
        return Ok(SingleOutcome::Skipped);
    };

    let path = resolve_executable(name, env)?;
    let mut plan = ChildPlan::new(&path, &cmd.argv, env)?;
    if let Some(file) = &cmd.input_file {
        plan.stdin_from_file(file)?;
    }
    if let Some(file) = &cmd.output_file {
        plan.stdout_to_file(file)?;
    }

    let mut handle = spawn(plan)?;

    if cmd.background {
        info!("[{}] started in background: {name}", handle.pid());
        return Ok(SingleOutcome::Background(handle));
    }

    let status = handle.wait()?;
    debug!("{name} finished: {status}");
    Ok(SingleOutcome::Foreground(status))
}
