use std::path::{Path, PathBuf};

use nix::unistd::{AccessFlags, access};

use crate::env::Environment;
use crate::error::ShellError;

/// Outcome of a search-path lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// First regular file with execute permission, in search-path order.
    Found(PathBuf),
    /// No executable match, but this regular file matched the name.
    NotExecutable(PathBuf),
    NotFound,
}

enum Candidate {
    Executable,
    Regular,
    Missing,
}

fn classify(path: &Path) -> Candidate {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => {
            if access(path, AccessFlags::X_OK).is_ok() {
                Candidate::Executable
            } else {
                Candidate::Regular
            }
        }
        _ => Candidate::Missing,
    }
}

/// Resolve a command name against the environment's `PATH`.
///
/// Directories are scanned in list order on every call. An empty entry
/// stands for the current directory. Names containing `/` are not searched:
/// they are checked directly, relative to the environment's working
/// directory.
pub fn resolve(name: &str, env: &Environment) -> Resolution {
    if name.is_empty() {
        return Resolution::NotFound;
    }

    if name.contains('/') {
        let path = env.current_dir().join(name);
        return match classify(&path) {
            Candidate::Executable => Resolution::Found(path),
            Candidate::Regular => Resolution::NotExecutable(path),
            Candidate::Missing => Resolution::NotFound,
        };
    }

    let search_path = env.search_path();
    if search_path.is_empty() {
        return Resolution::NotFound;
    }

    let mut first_regular = None;
    for dir in search_path.split(':') {
        let dir = if dir.is_empty() { Path::new(".") } else { Path::new(dir) };
        let candidate = dir.join(name);
        match classify(&candidate) {
            Candidate::Executable => return Resolution::Found(candidate),
            Candidate::Regular => {
                first_regular.get_or_insert(candidate);
            }
            Candidate::Missing => {}
        }
    }

    match first_regular {
        Some(path) => Resolution::NotExecutable(path),
        None => Resolution::NotFound,
    }
}

/// [`resolve`], with the two failure cases mapped onto [`ShellError`].
pub fn resolve_executable(name: &str, env: &Environment) -> Result<PathBuf, ShellError> {
    match resolve(name, env) {
        Resolution::Found(path) => Ok(path),
        Resolution::NotExecutable(path) => Err(ShellError::Permission {
            name: name.to_string(),
            path,
        }),
        Resolution::NotFound => Err(ShellError::Resolution {
            name: name.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fn touch(dir: &Path, name: &str, mode: u32) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
        path
    }

    fn env_with_path(path: &str) -> Environment {
        Environment::from_pairs([("PATH", path)])
    }

    #[test]
    fn finds_sh_in_bin() {
        let env = env_with_path("/nonexistent-dir:/bin");
        match resolve("sh", &env) {
            Resolution::Found(p) => assert_eq!(p, Path::new("/bin/sh")),
            other => panic!("expected /bin/sh, got {other:?}"),
        }
    }

    #[test]
    fn first_directory_wins() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        touch(a.path(), "tool", 0o755);
        touch(b.path(), "tool", 0o755);
        let env = env_with_path(&format!("{}:{}", a.path().display(), b.path().display()));
        assert_eq!(resolve("tool", &env), Resolution::Found(a.path().join("tool")));
    }

    #[test]
    fn skips_non_executable_for_later_executable() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        touch(a.path(), "tool", 0o644);
        touch(b.path(), "tool", 0o755);
        let env = env_with_path(&format!("{}:{}", a.path().display(), b.path().display()));
        assert_eq!(resolve("tool", &env), Resolution::Found(b.path().join("tool")));
    }

    #[test]
    fn non_executable_only() {
        let a = tempfile::tempdir().unwrap();
        let path = touch(a.path(), "tool", 0o644);
        let env = env_with_path(&a.path().display().to_string());
        assert_eq!(resolve("tool", &env), Resolution::NotExecutable(path));
        assert!(matches!(
            resolve_executable("tool", &env),
            Err(ShellError::Permission { .. })
        ));
    }

    #[test]
    fn directories_are_not_matches() {
        let a = tempfile::tempdir().unwrap();
        fs::create_dir(a.path().join("tool")).unwrap();
        let env = env_with_path(&a.path().display().to_string());
        assert_eq!(resolve("tool", &env), Resolution::NotFound);
    }

    #[test]
    fn absent_everywhere() {
        let env = env_with_path("/bin:/usr/bin");
        assert_eq!(resolve("nosuchcmd123", &env), Resolution::NotFound);
        assert!(matches!(
            resolve_executable("nosuchcmd123", &env),
            Err(ShellError::Resolution { .. })
        ));
    }

    #[test]
    fn unset_path_finds_nothing() {
        let env = Environment::from_pairs(Vec::<(String, String)>::new());
        assert_eq!(resolve("sh", &env), Resolution::NotFound);
    }

    #[test]
    fn absolute_name_is_checked_directly() {
        let env = env_with_path("/nonexistent-dir");
        assert_eq!(
            resolve("/bin/sh", &env),
            Resolution::Found(PathBuf::from("/bin/sh"))
        );
        assert_eq!(resolve("/bin/nonexisting", &env), Resolution::NotFound);
    }

    #[test]
    fn empty_name_is_not_found() {
        let env = env_with_path("/bin");
        assert_eq!(resolve("", &env), Resolution::NotFound);
    }

    #[test]
    fn rescans_on_every_call() {
        let a = tempfile::tempdir().unwrap();
        let env = env_with_path(&a.path().display().to_string());
        assert_eq!(resolve("late", &env), Resolution::NotFound);
        touch(a.path(), "late", 0o755);
        assert_eq!(resolve("late", &env), Resolution::Found(a.path().join("late")));
    }
}
