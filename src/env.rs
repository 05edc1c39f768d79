use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

/// Read-only view of the environment the shell hands to its children.
///
/// Captured once at startup and passed explicitly to variable expansion,
/// path resolution and `execve`. Children receive an exact copy; nothing a
/// child does is ever reflected back here.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: BTreeMap<OsString, OsString>,
    current_dir: PathBuf,
}

impl Environment {
    /// Snapshot the current process environment and working directory.
    ///
    /// Every entry is kept byte for byte, including ones that are not UTF-8.
    pub fn capture() -> Self {
        let vars = std::env::vars_os().collect();
        let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self { vars, current_dir }
    }

    /// Build an environment from explicit pairs. Used by tests and embedders.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        let vars = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self { vars, current_dir }
    }

    /// Value of `name`, when it is set and valid UTF-8.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(OsStr::new(name)).and_then(|v| v.to_str())
    }

    /// The colon-separated executable search path, or empty when unset.
    pub fn search_path(&self) -> &str {
        self.get("PATH").unwrap_or("")
    }

    pub fn current_dir(&self) -> &Path {
        &self.current_dir
    }

    pub(crate) fn set_current_dir(&mut self, dir: PathBuf) {
        self.current_dir = dir;
    }

    /// Raw `NAME=value` entries in a stable order, ready for `execve`.
    pub fn entries(&self) -> impl Iterator<Item = Vec<u8>> + '_ {
        self.vars.iter().map(|(k, v)| {
            let mut entry = Vec::with_capacity(k.len() + v.len() + 1);
            entry.extend_from_slice(k.as_bytes());
            entry.push(b'=');
            entry.extend_from_slice(v.as_bytes());
            entry
        })
    }
}
