//! Command tree handed to the executor by the parser.
//!
//! Trees are immutable once built and every node is owned by its parent.

pub mod word;

pub use word::{Word, WordPart};

use crate::error::ExecError;
use serde::{Deserialize, Serialize};
use std::ffi::CString;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandNode {
    Leaf(SimpleCommand),
    Binary {
        op: Operator,
        left: Box<CommandNode>,
        right: Box<CommandNode>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// `a ; b`
    Sequential,
    /// `a & b` - both sides run concurrently in their own processes
    Parallel,
    /// `a | b`
    Pipe,
    /// `a && b` - right runs only when left exits 0
    #[serde(alias = "conditional_zero")]
    And,
    /// `a || b` - right runs only when left exits nonzero
    #[serde(alias = "conditional_nzero")]
    Or,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Sequential => ";",
            Operator::Parallel => "&",
            Operator::Pipe => "|",
            Operator::And => "&&",
            Operator::Or => "||",
        }
    }

    /// Binding strength used when rendering, higher binds tighter.
    fn precedence(&self) -> u8 {
        match self {
            Operator::Sequential | Operator::Parallel => 0,
            Operator::And | Operator::Or => 1,
            Operator::Pipe => 2,
        }
    }
}

/// How output and error redirect targets are opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IoMode {
    /// `>` and `2>`: truncate
    #[default]
    Regular,
    /// `>>`
    OutAppend,
    /// `2>>`
    ErrAppend,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleCommand {
    pub verb: Word,
    #[serde(default)]
    pub params: Vec<Word>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Word>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Word>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Word>,
    #[serde(default)]
    pub io_mode: IoMode,
}

impl SimpleCommand {
    pub fn new(verb: impl Into<Word>) -> Self {
        Self {
            verb: verb.into(),
            params: Vec::new(),
            input: None,
            output: None,
            error: None,
            io_mode: IoMode::Regular,
        }
    }

    pub fn arg(mut self, param: impl Into<Word>) -> Self {
        self.params.push(param.into());
        self
    }

    pub fn args<I, W>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = W>,
        W: Into<Word>,
    {
        self.params.extend(params.into_iter().map(Into::into));
        self
    }

    /// `< target`
    pub fn stdin(mut self, target: impl Into<Word>) -> Self {
        self.input = Some(target.into());
        self
    }

    /// `> target`
    pub fn stdout(mut self, target: impl Into<Word>) -> Self {
        self.output = Some(target.into());
        self
    }

    /// `2> target`
    pub fn stderr(mut self, target: impl Into<Word>) -> Self {
        self.error = Some(target.into());
        self
    }

    pub fn io_mode(mut self, mode: IoMode) -> Self {
        self.io_mode = mode;
        self
    }

    /// Build the argument vector passed to `execvp`: the resolved verb
    /// followed by every resolved parameter. Parameters with no fragments
    /// are skipped.
    pub fn argv(&self) -> Result<Vec<CString>, ExecError> {
        let verb = self
            .verb
            .resolve()
            .ok_or(ExecError::Construction("command has no verb"))?;

        std::iter::once(verb)
            .chain(self.params.iter().filter_map(Word::resolve))
            .map(|arg| {
                CString::new(arg).map_err(|e| {
                    ExecError::InvalidArgument(String::from_utf8_lossy(&e.into_vec()).into_owned())
                })
            })
            .collect()
    }
}

impl fmt::Display for SimpleCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.verb)?;
        for param in &self.params {
            write!(f, " {}", param)?;
        }
        if let Some(input) = &self.input {
            write!(f, " < {}", input)?;
        }
        match (&self.output, &self.error) {
            (Some(out), Some(err)) if out == err => {
                let op = if self.io_mode == IoMode::Regular { "&>" } else { "&>>" };
                return write!(f, " {} {}", op, out);
            }
            _ => {}
        }
        if let Some(out) = &self.output {
            let op = if self.io_mode == IoMode::OutAppend { ">>" } else { ">" };
            write!(f, " {} {}", op, out)?;
        }
        if let Some(err) = &self.error {
            let op = if self.io_mode == IoMode::ErrAppend { "2>>" } else { "2>" };
            write!(f, " {} {}", op, err)?;
        }
        Ok(())
    }
}

impl CommandNode {
    pub fn binary(
        op: Operator,
        left: impl Into<CommandNode>,
        right: impl Into<CommandNode>,
    ) -> Self {
        CommandNode::Binary {
            op,
            left: Box::new(left.into()),
            right: Box::new(right.into()),
        }
    }

    pub fn seq(left: impl Into<CommandNode>, right: impl Into<CommandNode>) -> Self {
        Self::binary(Operator::Sequential, left, right)
    }

    pub fn parallel(left: impl Into<CommandNode>, right: impl Into<CommandNode>) -> Self {
        Self::binary(Operator::Parallel, left, right)
    }

    pub fn pipe(left: impl Into<CommandNode>, right: impl Into<CommandNode>) -> Self {
        Self::binary(Operator::Pipe, left, right)
    }

    pub fn and(left: impl Into<CommandNode>, right: impl Into<CommandNode>) -> Self {
        Self::binary(Operator::And, left, right)
    }

    pub fn or(left: impl Into<CommandNode>, right: impl Into<CommandNode>) -> Self {
        Self::binary(Operator::Or, left, right)
    }

    /// Write `child`, parenthesized when it binds looser than `parent` or
    /// would otherwise re-associate.
    fn fmt_child(
        child: &CommandNode,
        parent: Operator,
        right_side: bool,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match child {
            CommandNode::Binary { op, .. }
                if op.precedence() < parent.precedence()
                    || (right_side && op.precedence() == parent.precedence()) =>
            {
                write!(f, "({})", child)
            }
            _ => write!(f, "{}", child),
        }
    }
}

impl From<SimpleCommand> for CommandNode {
    fn from(cmd: SimpleCommand) -> Self {
        CommandNode::Leaf(cmd)
    }
}

impl fmt::Display for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandNode::Leaf(cmd) => write!(f, "{}", cmd),
            CommandNode::Binary { op, left, right } => {
                Self::fmt_child(left, *op, false, f)?;
                match op {
                    Operator::Sequential => f.write_str("; ")?,
                    _ => write!(f, " {} ", op.symbol())?,
                }
                Self::fmt_child(right, *op, true, f)
            }
        }
    }
}
