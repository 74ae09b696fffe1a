//! Attach a leaf command's redirect targets to fds 0, 1 and 2.
//!
//! Every opened file is a `File` guard: it is duplicated onto its standard
//! channel and then dropped, which closes it on success and error paths alike.

use crate::ast::{IoMode, SimpleCommand, Word};
use crate::error::ExecError;
use log::debug;
use nix::unistd::dup2;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::{AsFd, AsRawFd, OwnedFd, RawFd};
use std::os::unix::fs::OpenOptionsExt;

const STDIN: RawFd = libc::STDIN_FILENO;
const STDOUT: RawFd = libc::STDOUT_FILENO;
const STDERR: RawFd = libc::STDERR_FILENO;

fn read_options() -> OpenOptions {
    let mut options = OpenOptions::new();
    options.read(true);
    options
}

fn write_options(append: bool) -> OpenOptions {
    let mut options = OpenOptions::new();
    options.write(true).create(true).mode(0o644);
    if append {
        options.append(true);
    } else {
        options.truncate(true);
    }
    options
}

fn target(word: Option<&Word>) -> Option<String> {
    word.and_then(Word::resolve)
}

fn open(path: &str, options: &OpenOptions) -> Result<File, ExecError> {
    options.open(path).map_err(|source| ExecError::Redirect {
        path: path.to_string(),
        source,
    })
}

/// Duplicate `file` onto every fd in `channels`, then close it.
fn attach(file: File, channels: &[RawFd]) -> Result<(), ExecError> {
    for &fd in channels {
        dup2(file.as_raw_fd(), fd).map_err(|source| ExecError::Dup { fd, source })?;
    }
    Ok(())
}

/// Redirect the current process for an external command: input first,
/// then output and error.
///
/// Called in the forked child right before `execvp`.
pub fn apply(cmd: &SimpleCommand) -> Result<(), ExecError> {
    if let Some(path) = target(cmd.input.as_ref()) {
        debug!("stdin < {}", path);
        attach(open(&path, &read_options())?, &[STDIN])?;
    }

    match (target(cmd.output.as_ref()), target(cmd.error.as_ref())) {
        // One open for both channels so two truncating opens cannot clobber
        // each other's output
        (Some(out), Some(err)) if out == err => {
            debug!("stdout, stderr > {}", out);
            let append = cmd.io_mode != IoMode::Regular;
            attach(open(&out, &write_options(append))?, &[STDOUT, STDERR])?;
        }
        (out, err) => {
            if let Some(path) = out {
                debug!("stdout > {}", path);
                let append = cmd.io_mode == IoMode::OutAppend;
                attach(open(&path, &write_options(append))?, &[STDOUT])?;
            }
            if let Some(path) = err {
                debug!("stderr > {}", path);
                let append = cmd.io_mode == IoMode::ErrAppend;
                attach(open(&path, &write_options(append))?, &[STDERR])?;
            }
        }
    }

    Ok(())
}

/// Holds the evaluating process's original stderr while a builtin runs with
/// its stderr redirected; restores it on drop.
#[derive(Debug)]
pub struct StderrGuard {
    saved: OwnedFd,
}

impl StderrGuard {
    fn attach(file: File) -> Result<Self, ExecError> {
        let saved = io::stderr()
            .as_fd()
            .try_clone_to_owned()
            .map_err(|source| ExecError::Redirect {
                path: "<stderr>".to_string(),
                source,
            })?;
        attach(file, &[STDERR])?;
        Ok(Self { saved })
    }
}

impl Drop for StderrGuard {
    fn drop(&mut self) {
        let _ = dup2(self.saved.as_raw_fd(), STDERR);
    }
}

/// Redirection for `cd`, which runs inside the evaluating process.
///
/// The output target is created and truncated but never attached to stdout.
/// The error target is attached, with the same truncating flags, until the
/// returned guard is dropped.
pub fn apply_for_cd(cmd: &SimpleCommand) -> Result<Option<StderrGuard>, ExecError> {
    let truncate = write_options(false);

    if let Some(path) = target(cmd.output.as_ref()) {
        drop(open(&path, &truncate)?);
    }

    match target(cmd.error.as_ref()) {
        Some(path) => Ok(Some(StderrGuard::attach(open(&path, &truncate)?)?)),
        None => Ok(None),
    }
}
