//! Commands handled inside the shell process.
//!
//! A built-in never creates a process. Recognition is argument-aware: a
//! record-store verb only counts as built-in when its operands address the
//! store, so plain `ls` or `cp a b` still run the system executables.

/// Directory change.
pub mod cd;
/// Record-store verbs routed to a [`record::RecordStore`].
pub mod record;

pub use cd::ChangeDir;
pub use record::{DetachedStore, RecordCommands, RecordRequest, RecordStore};

use crate::config;
use crate::env::Environment;
use crate::error::ShellError;

/// A command the shell runs itself.
pub trait Builtin {
    /// Whether this built-in claims the tokenized line.
    fn matches(&self, argv: &[String]) -> bool;

    /// Run it. Returns text for the session to print (possibly empty).
    fn run(&mut self, argv: &[String], env: &mut Environment) -> Result<String, ShellError>;
}

/// Ordered set of built-ins; the first match wins.
pub struct BuiltinRegistry {
    builtins: Vec<Box<dyn Builtin>>,
}

impl BuiltinRegistry {
    /// Built-ins named by `config`, with record verbs going to a detached store.
    pub fn from_config(config: &config::Builtins) -> Self {
        Self::with_store(config, Box::new(DetachedStore))
    }

    /// Built-ins named by `config`, with record verbs going to `store`.
    pub fn with_store(config: &config::Builtins, store: Box<dyn RecordStore>) -> Self {
        let builtins: Vec<Box<dyn Builtin>> = vec![
            Box::new(ChangeDir::new(config.change_dir.clone())),
            Box::new(RecordCommands::new(
                config.record_verbs.clone(),
                config.record_prefix.clone(),
                store,
            )),
        ];
        Self { builtins }
    }

    #[cfg(test)]
    fn is_builtin(&self, argv: &[String]) -> bool {
        self.builtins.iter().any(|b| b.matches(argv))
    }

    /// Run the matching built-in, or `None` when the line is not one.
    pub fn run(&mut self, argv: &[String], env: &mut Environment) -> Option<Result<String, ShellError>> {
        let builtin = self.builtins.iter_mut().find(|b| b.matches(argv))?;
        Some(builtin.run(argv, env))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(words: &[&str]) -> Vec<String> {
        words.iter().map(|s| s.to_string()).collect()
    }

    fn registry() -> BuiltinRegistry {
        BuiltinRegistry::from_config(&config::Config::default_config().builtins)
    }

    #[test]
    fn cd_is_always_builtin() {
        let r = registry();
        assert!(r.is_builtin(&argv(&["cd"])));
        assert!(r.is_builtin(&argv(&["cd", "/tmp"])));
    }

    #[test]
    fn plain_system_commands_are_not_builtin() {
        let r = registry();
        assert!(!r.is_builtin(&argv(&["ls", "-la"])));
        assert!(!r.is_builtin(&argv(&["cp", "a", "b"])));
        assert!(!r.is_builtin(&argv(&["echo", "+x"])));
        assert!(!r.is_builtin(&argv(&["ls"])));
    }

    #[test]
    fn record_operands_make_verbs_builtin() {
        let r = registry();
        assert!(r.is_builtin(&argv(&["ls", "+docs"])));
        assert!(r.is_builtin(&argv(&["cp", "notes.txt", "+notes"])));
        assert!(r.is_builtin(&argv(&["merge", "+a", "+b", "+c"])));
    }

    #[test]
    fn detached_store_reports_error() {
        let mut r = registry();
        let mut env = Environment::from_pairs([("HOME", "/")]);
        let err = r.run(&argv(&["show", "+x"]), &mut env).unwrap().unwrap_err();
        assert!(matches!(err, ShellError::Builtin(_)));
        assert!(r.run(&argv(&["echo", "hi"]), &mut env).is_none());
    }
}
