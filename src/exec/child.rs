//! Everything that runs between `fork` and `execve`.
//!
//! A [`ChildPlan`] is fully built in the shell before forking: C strings for
//! the path, argv and environment, the descriptors to install, and the
//! diagnostic text to print on failure. The forked child then only performs
//! async-signal-safe calls (`signal`, `open`, `dup2`, `close`, `write`,
//! `execve`, `_exit`) and never returns into shell code.

use std::ffi::CString;
use std::os::fd::RawFd;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use log::debug;
use nix::errno::Errno;
use nix::fcntl::{FcntlArg, FdFlag, OFlag, fcntl, open};
use nix::sys::signal::{SigHandler, Signal, signal};
use nix::sys::stat::Mode;
use nix::unistd::{ForkResult, close, dup2, execve, fork};

use super::ProcessHandle;
use crate::env::Environment;
use crate::error::ShellError;
use crate::parse::render_argv;

/// Exit status of a child whose redirection target could not be opened.
pub const REDIRECT_FAILED: i32 = 125;
/// Exit status of a child whose image could not be replaced.
pub const EXEC_FAILED: i32 = 126;

const STDIN: RawFd = 0;
const STDOUT: RawFd = 1;

fn c_string(s: &str) -> Result<CString, ShellError> {
    c_bytes(s.as_bytes())
}

fn c_bytes(bytes: &[u8]) -> Result<CString, ShellError> {
    CString::new(bytes).map_err(|_| ShellError::InvalidArgument(String::from_utf8_lossy(bytes).into_owned()))
}

/// Where a standard stream slot gets its descriptor from.
enum Source {
    /// Open this file in the child.
    File {
        path: CString,
        flags: OFlag,
        mode: Mode,
        diagnostic: Vec<u8>,
    },
    /// Duplicate an inherited descriptor (a pipe end).
    Fd(RawFd),
}

impl Source {
    /// Install onto `slot`. On failure, returns the errno together with the
    /// diagnostic prefix to print.
    fn install(&self, slot: RawFd) -> Result<(), (Errno, &[u8])> {
        match self {
            Source::File {
                path,
                flags,
                mode,
                diagnostic,
            } => {
                let fd = open(path.as_c_str(), *flags, *mode).map_err(|e| (e, diagnostic.as_slice()))?;
                if fd != slot {
                    dup2(fd, slot).map_err(|e| (e, diagnostic.as_slice()))?;
                    let _ = close(fd);
                }
                Ok(())
            }
            Source::Fd(fd) if *fd == slot => {
                // Already in place; only drop close-on-exec so it survives execve.
                fcntl(slot, FcntlArg::F_SETFD(FdFlag::empty()))
                    .map_err(|e| (e, b"microsh: fcntl: ".as_slice()))?;
                Ok(())
            }
            Source::Fd(fd) => {
                dup2(*fd, slot).map_err(|e| (e, b"microsh: dup2: ".as_slice()))?;
                Ok(())
            }
        }
    }
}

/// A fully prepared child process image.
pub(crate) struct ChildPlan {
    path: CString,
    argv: Vec<CString>,
    envp: Vec<CString>,
    stdin: Option<Source>,
    stdout: Option<Source>,
    /// Inherited descriptors to release once the standard slots are set up.
    close_fds: Vec<RawFd>,
    exec_diagnostic: Vec<u8>,
    label: String,
}

impl ChildPlan {
    pub(crate) fn new(path: &Path, argv: &[String], env: &Environment) -> Result<Self, ShellError> {
        Ok(Self {
            path: c_bytes(path.as_os_str().as_bytes())?,
            argv: argv.iter().map(|a| c_string(a)).collect::<Result<_, _>>()?,
            envp: env.entries().map(|e| c_bytes(&e)).collect::<Result<_, _>>()?,
            stdin: None,
            stdout: None,
            close_fds: Vec::new(),
            exec_diagnostic: format!("microsh: {}: cannot execute: ", argv.first().map_or("", String::as_str))
                .into_bytes(),
            label: render_argv(argv),
        })
    }

    /// Read standard input from `file`, opened read-only in the child.
    pub(crate) fn stdin_from_file(&mut self, file: &str) -> Result<(), ShellError> {
        self.stdin = Some(Source::File {
            path: c_string(file)?,
            flags: OFlag::O_RDONLY,
            mode: Mode::empty(),
            diagnostic: format!("microsh: {file}: cannot open for reading: ").into_bytes(),
        });
        Ok(())
    }

    /// Write standard output to `file`, created or truncated with mode 0644.
    pub(crate) fn stdout_to_file(&mut self, file: &str) -> Result<(), ShellError> {
        self.stdout = Some(Source::File {
            path: c_string(file)?,
            flags: OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC,
            mode: Mode::S_IRUSR | Mode::S_IWUSR | Mode::S_IRGRP | Mode::S_IROTH,
            diagnostic: format!("microsh: {file}: cannot open for writing: ").into_bytes(),
        });
        Ok(())
    }

    pub(crate) fn stdin_from_fd(&mut self, fd: RawFd) {
        self.stdin = Some(Source::Fd(fd));
    }

    pub(crate) fn stdout_to_fd(&mut self, fd: RawFd) {
        self.stdout = Some(Source::Fd(fd));
    }

    pub(crate) fn close_after_setup(&mut self, fds: impl IntoIterator<Item = RawFd>) {
        self.close_fds.extend(fds);
    }

    pub(crate) fn label(&self) -> &str {
        &self.label
    }

    /// Runs in the forked child. Never returns.
    fn exec(self) -> ! {
        // The Rust runtime ignores SIGPIPE and that disposition survives
        // execve; pipeline writers must see the default again.
        // SAFETY: restoring SIG_DFL installs no Rust handler.
        let _ = unsafe { signal(Signal::SIGPIPE, SigHandler::SigDfl) };

        if let Some(source) = &self.stdin
            && let Err((errno, diagnostic)) = source.install(STDIN)
        {
            fail(diagnostic, errno, REDIRECT_FAILED);
        }
        if let Some(source) = &self.stdout
            && let Err((errno, diagnostic)) = source.install(STDOUT)
        {
            fail(diagnostic, errno, REDIRECT_FAILED);
        }

        for &fd in &self.close_fds {
            if fd > 2 {
                let _ = close(fd);
            }
        }

        let errno = match execve(&self.path, &self.argv, &self.envp) {
            Err(errno) => errno,
            Ok(never) => match never {},
        };
        fail(&self.exec_diagnostic, errno, EXEC_FAILED)
    }
}

/// Print `<prefix><errno text>\n` to stderr and terminate the child.
fn fail(prefix: &[u8], errno: Errno, status: i32) -> ! {
    let stderr = std::io::stderr();
    let _ = nix::unistd::write(&stderr, prefix);
    let _ = nix::unistd::write(&stderr, errno.desc().as_bytes());
    let _ = nix::unistd::write(&stderr, b"\n");
    // SAFETY: _exit skips atexit handlers and destructors, which belong to
    // the parent's copy of this address space.
    unsafe { nix::libc::_exit(status) }
}

/// Fork and run `plan` in the child; the parent gets a handle.
pub(crate) fn spawn(plan: ChildPlan) -> Result<ProcessHandle, ShellError> {
    // SAFETY: the child branch only calls async-signal-safe functions before
    // execve or _exit; every allocation happened while building `plan`.
    match unsafe { fork() }.map_err(ShellError::os("fork"))? {
        ForkResult::Parent { child } => {
            debug!("spawned pid {child}: {}", plan.label());
            Ok(ProcessHandle::new(child))
        }
        ForkResult::Child => plan.exec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::{OsStr, OsString};
    use std::os::unix::ffi::OsStringExt;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn path_bytes_are_passed_through_unchanged() {
        let path = Path::new(OsStr::from_bytes(b"/tmp/caf\xe9/tool"));
        let plan = ChildPlan::new(path, &argv(&["tool"]), &Environment::default()).unwrap();
        assert_eq!(plan.path.as_bytes(), b"/tmp/caf\xe9/tool");
    }

    #[test]
    fn environment_bytes_are_passed_through_unchanged() {
        let env = Environment::from_pairs([(OsString::from("RAW"), OsString::from_vec(b"\xffabc".to_vec()))]);
        let plan = ChildPlan::new(Path::new("/bin/true"), &argv(&["true"]), &env).unwrap();
        assert_eq!(plan.envp.len(), 1);
        assert_eq!(plan.envp[0].as_bytes(), b"RAW=\xffabc");
    }
}
