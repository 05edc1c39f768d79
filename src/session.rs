//! Read loops: script files and the interactive prompt.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use log::{info, warn};

use crate::config::{Config, Inspiration, Settings};
use crate::dispatch::{Dispatch, Shell};
use crate::error::ShellError;

/// Drives a [`Shell`] from a line source. Diagnostics and built-in output go
/// to the writer handed to each loop; children write to the real stdout.
pub struct Session {
    shell: Shell,
    settings: Settings,
    inspiration: Inspiration,
}

impl Session {
    pub fn new(shell: Shell, config: &Config) -> Self {
        Self {
            shell,
            settings: config.settings.clone(),
            inspiration: config.inspiration.clone(),
        }
    }

    fn is_exit(&self, line: &str) -> bool {
        line.eq_ignore_ascii_case(&self.settings.exit_keyword)
    }

    /// Run script lines in order. Blank and comment lines are skipped; the
    /// exit keyword stops the script.
    pub fn run_script<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty()
                || (!self.settings.comment_prefix.is_empty()
                    && line.starts_with(self.settings.comment_prefix.as_str()))
            {
                continue;
            }
            if self.is_exit(line) {
                break;
            }
            self.execute(line, out)?;
        }
        Ok(())
    }

    /// Run the script at `path`. A missing file is reported on `out` and is
    /// not an error.
    pub fn run_script_path<W: Write>(&mut self, path: &Path, out: &mut W) -> io::Result<()> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                writeln!(out, "Error: File '{}' not found", path.display())?;
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        info!("running script {}", path.display());
        self.run_script(BufReader::new(file), out)
    }

    /// Prompt, read, dispatch until the exit keyword or end of input.
    pub fn run_interactive<R: BufRead, W: Write>(&mut self, mut input: R, out: &mut W) -> io::Result<()> {
        info!("interactive session started");
        let mut buf = String::new();
        loop {
            write!(out, "{}", self.settings.prompt)?;
            out.flush()?;

            buf.clear();
            if input.read_line(&mut buf)? == 0 {
                writeln!(out)?;
                break;
            }
            let line = buf.trim();
            if self.is_exit(line) {
                break;
            }
            if !self.inspiration.keyword.is_empty()
                && line.eq_ignore_ascii_case(&self.inspiration.keyword)
            {
                let phrase = self
                    .shell
                    .env()
                    .get(&self.inspiration.env_var)
                    .unwrap_or(self.inspiration.fallback.as_str());
                writeln!(out, "{phrase}")?;
                continue;
            }
            self.execute(line, out)?;
        }
        info!("interactive session ended");
        Ok(())
    }

    fn execute<W: Write>(&mut self, line: &str, out: &mut W) -> io::Result<()> {
        if self.settings.reap_background {
            self.shell.reap_background();
        }
        match self.shell.dispatch(line) {
            Ok(Dispatch::Builtin(text)) => out.write_all(text.as_bytes())?,
            Ok(_) => {}
            Err(e) => {
                warn!("{line}: {e}");
                match e {
                    ShellError::Builtin(_) => writeln!(out, "{e}")?,
                    _ => writeln!(out, "microsh: {e}")?,
                }
            }
        }
        out.flush()
    }
}
