use std::path::PathBuf;

use log::debug;

use super::Builtin;
use crate::env::Environment;
use crate::error::ShellError;

/// Change the working directory of the shell and of every later child.
///
/// With no operand the target is `$HOME`, or `/` when `HOME` is unset.
pub struct ChangeDir {
    names: Vec<String>,
}

impl ChangeDir {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }
}

impl Builtin for ChangeDir {
    fn matches(&self, argv: &[String]) -> bool {
        argv.first().is_some_and(|name| self.names.contains(name))
    }

    fn run(&mut self, argv: &[String], env: &mut Environment) -> Result<String, ShellError> {
        let target = match argv.get(1) {
            Some(dir) => dir.clone(),
            None => env.get("HOME").unwrap_or("/").to_string(),
        };
        let path = env.current_dir().join(&target);

        match std::fs::metadata(&path) {
            Err(_) => {
                return Err(ShellError::Builtin(format!(
                    "cd: {target}: No such file or directory"
                )));
            }
            Ok(meta) if !meta.is_dir() => {
                return Err(ShellError::Builtin(format!("cd: {target}: Not a directory")));
            }
            Ok(_) => {}
        }

        std::env::set_current_dir(&path)
            .map_err(|e| ShellError::Builtin(format!("cd: {target}: {e}")))?;
        let now = std::env::current_dir().unwrap_or_else(|_| PathBuf::from(&path));
        debug!("cd {}", now.display());
        env.set_current_dir(now);
        Ok(String::new())
    }
}
