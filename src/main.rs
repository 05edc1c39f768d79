//! microsh: a line-oriented command interpreter.
//!
//! With a script path, runs each line of the script. Without one, reads
//! commands from an interactive `$ ` prompt.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::info;

use microsh::config::Config;
use microsh::dispatch::Shell;
use microsh::env::Environment;
use microsh::logging;
use microsh::session::Session;

#[derive(Debug, Parser)]
#[command(name = "microsh", version, about = "A small line-oriented shell")]
struct Cli {
    /// Script to run instead of reading from the prompt.
    script: Option<PathBuf>,

    /// Overlay configuration file (default: ~/.config/microsh/config.toml).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log level for the log file (error, warn, info, debug, trace, off).
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Print the merged configuration and exit.
    #[arg(long)]
    dump_config: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("microsh: config error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.dump_config {
        return match config.to_toml() {
            Ok(text) => {
                print!("{text}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("microsh: cannot serialize config: {e}");
                ExitCode::FAILURE
            }
        };
    }

    logging::init(&config.logging, cli.log_level.as_deref());
    info!("microsh {} starting", env!("CARGO_PKG_VERSION"));

    let shell = Shell::new(&config, Environment::capture());
    let mut session = Session::new(shell, &config);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = match &cli.script {
        Some(path) => session.run_script_path(path, &mut out),
        None => session.run_interactive(io::stdin().lock(), &mut out),
    };
    let _ = out.flush();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("microsh: {e}");
            ExitCode::FAILURE
        }
    }
}
