//! Recursive evaluation of command trees
//!
//! `;`, `&&` and `||` run in the evaluating process. `&` and `|` fork one
//! child per branch; each child evaluates its subtree and exits with the
//! result, so state changes made inside a branch never reach the parent.

mod leaf;
pub(crate) mod process;
pub mod redirect;

use crate::ast::{CommandNode, Operator};
use crate::builtins::Builtins;
use crate::config::Config;
use crate::error::{ErrorReport, ExecError, FAILURE_CODE};
use log::{debug, error};
use nix::unistd::{dup2, pipe};
use std::os::fd::{AsRawFd, OwnedFd, RawFd};

/// Result of evaluating a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Ordinary completion with a status in 0..=255
    Code(i32),
    /// `exit`/`quit` was run: stop evaluating and end the session
    Terminate,
}

impl ExitStatus {
    pub const SUCCESS: ExitStatus = ExitStatus::Code(0);
    pub const FAILURE: ExitStatus = ExitStatus::Code(FAILURE_CODE);

    /// Status to exit a process with. TERMINATE never crosses a process
    /// boundary and becomes a normal exit there.
    pub fn process_code(&self) -> i32 {
        match self {
            ExitStatus::Code(code) => code & 0xff,
            ExitStatus::Terminate => 0,
        }
    }
}

/// Evaluation state passed down the tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvalContext {
    /// Nesting depth of the node being evaluated (root is 0)
    pub depth: usize,
}

impl EvalContext {
    fn child(self) -> Self {
        Self {
            depth: self.depth + 1,
        }
    }
}

pub struct Executor {
    builtins: Builtins,
    config: Config,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            builtins: Builtins::new(),
            config,
        }
    }

    /// Top-level entry point.
    ///
    /// A missing tree terminates the session. Internal failures are reported
    /// on stderr and become an ordinary failure status.
    pub fn run(&self, tree: Option<&CommandNode>) -> ExitStatus {
        let Some(tree) = tree else {
            debug!("no command tree, terminating");
            return ExitStatus::Terminate;
        };

        match self.evaluate(tree) {
            Ok(status) => status,
            Err(err) => {
                self.report(&err, tree);
                ExitStatus::Code(err.exit_code())
            }
        }
    }

    /// Evaluate a tree from its root
    pub fn evaluate(&self, tree: &CommandNode) -> Result<ExitStatus, ExecError> {
        self.eval(tree, EvalContext::default())
    }

    fn eval(&self, node: &CommandNode, ctx: EvalContext) -> Result<ExitStatus, ExecError> {
        let (op, left, right) = match node {
            CommandNode::Leaf(cmd) => return self.execute_leaf(cmd, ctx),
            CommandNode::Binary { op, left, right } => (*op, left.as_ref(), right.as_ref()),
        };

        debug!("[{}] {}", ctx.depth, node);
        let ctx = ctx.child();

        match op {
            Operator::Sequential => match self.eval(left, ctx)? {
                ExitStatus::Terminate => Ok(ExitStatus::Terminate),
                ExitStatus::Code(_) => self.eval(right, ctx),
            },
            Operator::And => match self.eval(left, ctx)? {
                ExitStatus::Code(0) => self.eval(right, ctx),
                status => Ok(status),
            },
            Operator::Or => match self.eval(left, ctx)? {
                ExitStatus::Code(code) if code != 0 => self.eval(right, ctx),
                status => Ok(status),
            },
            Operator::Parallel => self.run_parallel(left, right, ctx),
            Operator::Pipe => self.run_pipe(left, right, ctx),
        }
    }

    /// Evaluate `node` inside a forked child and produce its exit status.
    fn branch_code(&self, node: &CommandNode, ctx: EvalContext) -> i32 {
        match self.eval(node, ctx) {
            Ok(status) => status.process_code(),
            Err(err) => {
                self.report(&err, node);
                err.exit_code()
            }
        }
    }

    fn run_parallel(
        &self,
        left: &CommandNode,
        right: &CommandNode,
        ctx: EvalContext,
    ) -> Result<ExitStatus, ExecError> {
        let first = process::fork_branch(|| self.branch_code(left, ctx))?;
        let second = match process::fork_branch(|| self.branch_code(right, ctx)) {
            Ok(pid) => pid,
            Err(err) => {
                let _ = process::wait_for(first, self.config.signal_status);
                return Err(err);
            }
        };

        // Both children are reaped even when the first wait fails
        let first_status = process::wait_for(first, self.config.signal_status);
        let second_status = process::wait_for(second, self.config.signal_status)?;
        first_status?;

        Ok(ExitStatus::Code(second_status))
    }

    fn run_pipe(
        &self,
        left: &CommandNode,
        right: &CommandNode,
        ctx: EvalContext,
    ) -> Result<ExitStatus, ExecError> {
        let (read_end, write_end) = pipe().map_err(ExecError::Pipe)?;

        let writer = process::fork_branch(|| {
            self.pipe_branch(left, ctx, &write_end, &read_end, libc::STDOUT_FILENO)
        })?;
        let reader = process::fork_branch(|| {
            self.pipe_branch(right, ctx, &read_end, &write_end, libc::STDIN_FILENO)
        });

        // The orchestrator never reads or writes the pipe. Holding either end
        // open would keep the reader from ever seeing EOF.
        drop(read_end);
        drop(write_end);

        let reader = match reader {
            Ok(pid) => pid,
            Err(err) => {
                let _ = process::wait_for(writer, self.config.signal_status);
                return Err(err);
            }
        };

        let writer_status = process::wait_for(writer, self.config.signal_status);
        let reader_status = process::wait_for(reader, self.config.signal_status)?;
        writer_status?;

        Ok(ExitStatus::Code(reader_status))
    }

    /// Body of one pipe branch: close the unused end, move `used` onto
    /// `channel`, close the original, then evaluate.
    ///
    /// Runs in a child that never returns, so closing the borrowed
    /// descriptors by number here cannot lead to a double close.
    fn pipe_branch(
        &self,
        node: &CommandNode,
        ctx: EvalContext,
        used: &OwnedFd,
        unused: &OwnedFd,
        channel: RawFd,
    ) -> i32 {
        let _ = nix::unistd::close(unused.as_raw_fd());

        if let Err(source) = dup2(used.as_raw_fd(), channel) {
            self.report(&ExecError::Dup { fd: channel, source }, node);
            return FAILURE_CODE;
        }
        let _ = nix::unistd::close(used.as_raw_fd());

        self.branch_code(node, ctx)
    }

    /// Print an internal error in the configured format
    fn report(&self, err: &ExecError, node: &CommandNode) {
        error!("{} while running `{}`", err, node);
        let report = ErrorReport::from(err).with_command(node.to_string());
        eprintln!("{}", report.render(self.config.error_format));
    }
}
