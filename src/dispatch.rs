//! Line dispatcher: turns one input line into built-in work, a single
//! supervised process, or a two-stage pipeline.

use log::{debug, info};
use nix::unistd::Pid;

use crate::builtins::{BuiltinRegistry, RecordStore};
use crate::config::Config;
use crate::env::Environment;
use crate::error::ShellError;
use crate::exec::{BackgroundJobs, ExitStatus, SingleOutcome, run_pipeline, run_single};
use crate::parse::{expand_variables, parse_command, render_argv, split_pipeline, tokenize};

/// What a dispatched line did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Nothing to run.
    Empty,
    /// Handled by a built-in; the text is its output.
    Builtin(String),
    Foreground(ExitStatus),
    Background(Pid),
    /// Statuses of both stages, in data-flow order.
    Pipeline(Vec<ExitStatus>),
}

/// Shell state that outlives a single line.
pub struct Shell {
    env: Environment,
    background_marker: String,
    builtins: BuiltinRegistry,
    jobs: BackgroundJobs,
}

impl Shell {
    pub fn new(config: &Config, env: Environment) -> Self {
        Self {
            env,
            background_marker: config.settings.background_marker.clone(),
            builtins: BuiltinRegistry::from_config(&config.builtins),
            jobs: BackgroundJobs::new(),
        }
    }

    /// Like [`Shell::new`], with record verbs served by `store`.
    pub fn with_store(config: &Config, env: Environment, store: Box<dyn RecordStore>) -> Self {
        Self {
            builtins: BuiltinRegistry::with_store(&config.builtins, store),
            ..Self::new(config, env)
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn jobs(&self) -> &BackgroundJobs {
        &self.jobs
    }

    /// Dispatch one line.
    ///
    /// Expansion runs first. A pipe delimiter outside quotes selects the
    /// pipeline path, which interprets no redirection, background marker or
    /// built-in. Otherwise the line is tokenized, offered to the built-ins,
    /// then parsed for redirection and a trailing background marker.
    pub fn dispatch(&mut self, line: &str) -> Result<Dispatch, ShellError> {
        let line = expand_variables(line, &self.env);

        if let Some(spec) = split_pipeline(&line) {
            let spec = spec?;
            debug!(
                "pipeline: {} | {}",
                render_argv(&spec.stage_a),
                render_argv(&spec.stage_b)
            );
            let outcome = run_pipeline(&spec, &self.env)?;
            return Ok(Dispatch::Pipeline(outcome.statuses));
        }

        let tokens = tokenize(&line);
        if tokens.is_empty() {
            return Ok(Dispatch::Empty);
        }

        if let Some(result) = self.builtins.run(&tokens, &mut self.env) {
            debug!("builtin: {}", render_argv(&tokens));
            return result.map(Dispatch::Builtin);
        }

        let cmd = parse_command(tokens, &self.background_marker)?;
        debug!("command: {}", render_argv(&cmd.argv));
        match run_single(&cmd, &self.env)? {
            SingleOutcome::Skipped => Ok(Dispatch::Empty),
            SingleOutcome::Foreground(status) => Ok(Dispatch::Foreground(status)),
            SingleOutcome::Background(handle) => {
                let pid = handle.pid();
                self.jobs.track(handle);
                Ok(Dispatch::Background(pid))
            }
        }
    }

    /// Collect finished background children. Returns how many were reaped.
    pub fn reap_background(&mut self) -> usize {
        let reaped = self.jobs.reap_finished();
        if !reaped.is_empty() {
            info!("reaped {} background job(s)", reaped.len());
        }
        reaped.len()
    }
}
