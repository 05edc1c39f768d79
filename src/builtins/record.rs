use log::debug;

use super::Builtin;
use crate::env::Environment;
use crate::error::ShellError;

/// One operation on the record store. Operands keep their record prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordRequest {
    Copy { from: String, to: String },
    Show { path: String },
    Merge { first: String, second: String, dest: String },
    Remove { path: String },
    MakeDir { path: String },
    RemoveDir { path: String },
    List { path: String },
}

/// Backend for the record-oriented pseudo-filesystem.
pub trait RecordStore {
    /// Perform `request`; returns text to print.
    fn apply(&mut self, request: RecordRequest) -> Result<String, ShellError>;
}

/// Store used when no backend is configured; every request fails.
#[derive(Debug, Default)]
pub struct DetachedStore;

impl RecordStore for DetachedStore {
    fn apply(&mut self, request: RecordRequest) -> Result<String, ShellError> {
        debug!("record request without store: {request:?}");
        Err(ShellError::Builtin("record store is not attached".into()))
    }
}

/// Routes record verbs (`cp`, `show`, `merge`, `rm`, `mkdir`, `rmdir`, `ls`)
/// to a [`RecordStore`].
pub struct RecordCommands {
    verbs: Vec<String>,
    prefix: String,
    store: Box<dyn RecordStore>,
}

impl RecordCommands {
    pub fn new(verbs: Vec<String>, prefix: String, store: Box<dyn RecordStore>) -> Self {
        Self {
            verbs,
            prefix,
            store,
        }
    }

    fn addressed(&self, operand: Option<&String>) -> bool {
        !self.prefix.is_empty() && operand.is_some_and(|o| o.contains(self.prefix.as_str()))
    }

    fn request(argv: &[String]) -> Result<RecordRequest, ShellError> {
        let Some((verb, ops)) = argv.split_first() else {
            return Err(ShellError::Builtin("missing record verb".into()));
        };
        let verb = verb.as_str();
        let arity = |n: usize| {
            if ops.len() == n {
                Ok(())
            } else {
                Err(ShellError::Builtin(format!(
                    "{verb}: expected {n} operand{}, got {}",
                    if n == 1 { "" } else { "s" },
                    ops.len()
                )))
            }
        };
        let one = || -> Result<String, ShellError> {
            arity(1)?;
            Ok(ops[0].clone())
        };
        Ok(match verb {
            "cp" => {
                arity(2)?;
                RecordRequest::Copy {
                    from: ops[0].clone(),
                    to: ops[1].clone(),
                }
            }
            "merge" => {
                arity(3)?;
                RecordRequest::Merge {
                    first: ops[0].clone(),
                    second: ops[1].clone(),
                    dest: ops[2].clone(),
                }
            }
            "show" => RecordRequest::Show { path: one()? },
            "rm" => RecordRequest::Remove { path: one()? },
            "mkdir" => RecordRequest::MakeDir { path: one()? },
            "rmdir" => RecordRequest::RemoveDir { path: one()? },
            "ls" => RecordRequest::List { path: one()? },
            other => return Err(ShellError::Builtin(format!("{other}: unknown record verb"))),
        })
    }
}

impl Builtin for RecordCommands {
    fn matches(&self, argv: &[String]) -> bool {
        let Some(verb) = argv.first() else {
            return false;
        };
        if !self.verbs.contains(verb) {
            return false;
        }
        match verb.as_str() {
            "cp" => self.addressed(argv.get(1)) || self.addressed(argv.get(2)),
            "merge" => argv.len() == 4,
            "show" | "rm" | "mkdir" | "rmdir" | "ls" => self.addressed(argv.get(1)),
            _ => false,
        }
    }

    fn run(&mut self, argv: &[String], _env: &mut Environment) -> Result<String, ShellError> {
        let request = Self::request(argv)?;
        self.store.apply(request).map_err(|e| match e {
            ShellError::Builtin(msg) => ShellError::Builtin(format!("{}: {msg}", argv[0])),
            other => other,
        })
    }
}
