//! Error taxonomy for everything the shell process itself can detect.
//!
//! Failures that happen inside an already-forked child (the image cannot be
//! replaced, a redirection target cannot be opened) never reach this type:
//! the child reports them on its own stderr and exits with one of the
//! statuses in [`crate::exec::child`].

use std::path::PathBuf;

use nix::errno::Errno;

/// Errors raised by the orchestrating shell before or around process creation.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    /// Malformed line: redirection operator without a target, or a pipeline
    /// with a missing or extra stage.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// The executable is absent from every search-path directory.
    #[error("{name}: command not found")]
    Resolution { name: String },

    /// A candidate exists on the search path but lacks execute permission.
    #[error("{name}: not executable ({})", path.display())]
    Permission { name: String, path: PathBuf },

    /// A word cannot be handed to `execve` (it contains a NUL byte).
    #[error("invalid argument {0:?}: contains a NUL byte")]
    InvalidArgument(String),

    /// A process primitive failed in the shell itself.
    #[error("{op} failed: {source}")]
    Os {
        op: &'static str,
        #[source]
        source: Errno,
    },

    /// A built-in collaborator reported a failure.
    #[error("{0}")]
    Builtin(String),
}

impl ShellError {
    pub(crate) fn os(op: &'static str) -> impl FnOnce(Errno) -> Self {
        move |source| ShellError::Os { op, source }
    }

    /// True for errors detected before any process was created.
    pub fn is_pre_spawn(&self) -> bool {
        !matches!(self, ShellError::Os { .. } | ShellError::Builtin(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_message_names_command() {
        let err = ShellError::Resolution {
            name: "nosuchcmd123".into(),
        };
        assert_eq!(err.to_string(), "nosuchcmd123: command not found");
    }

    #[test]
    fn permission_message_names_path() {
        let err = ShellError::Permission {
            name: "tool".into(),
            path: PathBuf::from("/opt/bin/tool"),
        };
        assert_eq!(err.to_string(), "tool: not executable (/opt/bin/tool)");
    }

    #[test]
    fn os_error_is_not_pre_spawn() {
        let err = ShellError::os("fork")(Errno::EAGAIN);
        assert!(!err.is_pre_spawn());
        assert!(err.to_string().starts_with("fork failed"));
        assert!(ShellError::Syntax("x".into()).is_pre_spawn());
    }
}
