//! microsh: a small line-oriented command interpreter.
//!
//! A line is expanded, split into at most two pipeline stages or parsed for
//! redirection and a background marker, then run as OS processes created
//! with `fork`/`execve` and collected with `waitpid`. Directory changes and
//! record-store verbs are handled in-process.
//!
//! # Architecture
//!
//! - **[`parse`]** — Tokenizer, variable expansion, redirection and pipeline splitting.
//! - **[`exec`]** — Path resolution, child setup, single-command and pipeline supervision, background jobs.
//! - **[`builtins`]** — In-process commands: `cd` and the record-store verbs.
//! - **[`dispatch`]** — Per-line routing between built-ins, single commands and pipelines.
//! - **[`session`]** — Script and interactive read loops.
//! - **[`config`]** — Configuration loading: embedded defaults + user overlay merge.
//! - **[`logging`]** — File logging to `~/.local/share/microsh/microsh.log`.

/// Built-in commands and the record-store seam.
pub mod builtins;
/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// Line dispatcher and long-lived shell state.
pub mod dispatch;
/// Environment snapshot handed to children.
pub mod env;
/// Shell error type.
pub mod error;
/// Process creation, wiring and reaping.
pub mod exec;
/// File logger setup.
pub mod logging;
/// Line parsing: tokens, expansion, redirection, pipelines.
pub mod parse;
/// Read loops.
pub mod session;

pub use dispatch::{Dispatch, Shell};
pub use error::ShellError;

/// Dispatch one line with the default config and the current process
/// environment.
///
/// This is the main entry point for tests and simple usage. Each call
/// starts from a fresh [`Shell`], so background jobs are not tracked across
/// calls.
pub fn dispatch(line: &str) -> Result<Dispatch, ShellError> {
    let config = config::Config::default_config();
    let mut shell = Shell::new(&config, env::Environment::capture());
    shell.dispatch(line)
}
