//! fork/wait primitives shared by external commands and concurrent operators

use crate::config::SignalStatus;
use crate::error::ExecError;
use log::{debug, warn};
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{fork, ForkResult, Pid};
use std::io::{self, Write};

/// Fork a child that runs `body` and exits with the status it returns.
///
/// Only the parent returns from this function.
pub(crate) fn fork_branch<F>(body: F) -> Result<Pid, ExecError>
where
    F: FnOnce() -> i32,
{
    // Anything still buffered would otherwise be written twice
    let _ = io::stdout().flush();

    match unsafe { fork() } {
        Ok(ForkResult::Parent { child }) => {
            debug!("forked child {}", child);
            Ok(child)
        }
        Ok(ForkResult::Child) => {
            let code = body();
            exit_child(code)
        }
        Err(errno) => Err(ExecError::Fork(errno)),
    }
}

/// Terminate a forked child without running the parent's exit handlers.
pub(crate) fn exit_child(code: i32) -> ! {
    let _ = io::stdout().flush();
    let _ = io::stderr().flush();
    unsafe { libc::_exit(code & 0xff) }
}

/// Block until `pid` terminates and translate its wait status to an exit code.
pub(crate) fn wait_for(pid: Pid, signals: SignalStatus) -> Result<i32, ExecError> {
    loop {
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => {
                debug!("child {} exited with {}", pid, code);
                return Ok(code);
            }
            Ok(WaitStatus::Signaled(_, signal, core_dumped)) => {
                warn!(
                    "child {} killed by {:?}{}",
                    pid,
                    signal,
                    if core_dumped { " (core dumped)" } else { "" }
                );
                return Ok(match signals {
                    SignalStatus::Shell => 128 + signal as i32,
                    SignalStatus::Lossy => 0,
                });
            }
            // Stop/continue notifications are not requested, keep waiting
            Ok(_) | Err(Errno::EINTR) => continue,
            Err(source) => {
                return Err(ExecError::Wait {
                    pid: pid.as_raw(),
                    source,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_for_unknown_child() {
        // pid 1 is never our child
        let result = wait_for(Pid::from_raw(1), SignalStatus::Shell);
        match result {
            Err(ExecError::Wait { pid, source }) => {
                assert_eq!(pid, 1);
                assert_eq!(source, Errno::ECHILD);
            }
            other => panic!("expected wait failure, got {:?}", other),
        }
    }
}
