//! Error types for command-tree execution
//!
//! `ExecError` is the internal taxonomy. `ErrorReport` is its structured,
//! user-facing form, rendered as text or JSON depending on configuration.

use crate::config::ErrorFormat;
use nix::errno::Errno;
use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Status reported for an ordinary failure
pub const FAILURE_CODE: i32 = 1;
/// Status of a child whose program could not be found
pub const NOT_FOUND_CODE: i32 = 127;
/// Status of a child whose program was found but could not be loaded
pub const NOT_EXECUTABLE_CODE: i32 = 126;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("malformed command tree: {0}")]
    Construction(&'static str),

    #[error("{path}: {source}")]
    Redirect {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot attach descriptor {fd}: {source}")]
    Dup { fd: i32, source: Errno },

    #[error("failed to fork: {0}")]
    Fork(Errno),

    #[error("failed to create pipe: {0}")]
    Pipe(Errno),

    #[error("failed to wait for process {pid}: {source}")]
    Wait { pid: i32, source: Errno },

    #[error("Execution failed for '{program}': {source}")]
    Exec { program: String, source: Errno },

    #[error("argument contains a NUL byte: {0:?}")]
    InvalidArgument(String),
}

impl ExecError {
    /// Stable machine-readable category
    pub fn error_code(&self) -> &'static str {
        match self {
            ExecError::Construction(_) => "MALFORMED_TREE",
            ExecError::Redirect { .. } => "REDIRECT_FAILED",
            ExecError::Dup { .. } => "DUP_FAILED",
            ExecError::Fork(_) => "FORK_FAILED",
            ExecError::Pipe(_) => "PIPE_FAILED",
            ExecError::Wait { .. } => "WAIT_FAILED",
            ExecError::Exec { source: Errno::ENOENT, .. } => "COMMAND_NOT_FOUND",
            ExecError::Exec { .. } => "EXEC_FAILED",
            ExecError::InvalidArgument(_) => "INVALID_ARGUMENT",
        }
    }

    /// Exit status a process reports when it dies of this error
    pub fn exit_code(&self) -> i32 {
        match self {
            ExecError::Exec { source: Errno::ENOENT, .. } => NOT_FOUND_CODE,
            ExecError::Exec { .. } => NOT_EXECUTABLE_CODE,
            _ => FAILURE_CODE,
        }
    }
}

/// Structured form of an error, for text or JSON output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorReport {
    /// Error code category
    pub error_code: String,
    /// Human-readable error message
    pub message: String,
    /// Exit status associated with the error
    pub exit_code: i32,
    /// Rendered command that was being executed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl ErrorReport {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>, exit_code: i32) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            exit_code,
            command: None,
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                r#"{{"error_code":"{}","message":"{}","exit_code":{}}}"#,
                self.error_code, self.message, self.exit_code
            )
        })
    }

    pub fn to_text(&self) -> String {
        match &self.command {
            Some(command) => format!("minish: {}: {}", command, self.message),
            None => format!("minish: {}", self.message),
        }
    }

    pub fn render(&self, format: ErrorFormat) -> String {
        match format {
            ErrorFormat::Text => self.to_text(),
            ErrorFormat::Json => self.to_json(),
        }
    }
}

impl From<&ExecError> for ErrorReport {
    fn from(err: &ExecError) -> Self {
        ErrorReport::new(err.error_code(), err.to_string(), err.exit_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_not_found() {
        let err = ExecError::Exec {
            program: "nosuchprog".to_string(),
            source: Errno::ENOENT,
        };
        assert_eq!(err.error_code(), "COMMAND_NOT_FOUND");
        assert_eq!(err.exit_code(), 127);
        assert!(err.to_string().starts_with("Execution failed for 'nosuchprog'"));
    }

    #[test]
    fn test_exec_not_executable() {
        let err = ExecError::Exec {
            program: "/etc/passwd".to_string(),
            source: Errno::EACCES,
        };
        assert_eq!(err.error_code(), "EXEC_FAILED");
        assert_eq!(err.exit_code(), 126);
    }

    #[test]
    fn test_redirect_message_names_path() {
        let err = ExecError::Redirect {
            path: "/nonexistent/in.txt".to_string(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert!(err.to_string().starts_with("/nonexistent/in.txt: "));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_report_json() {
        let report =
            ErrorReport::from(&ExecError::Fork(Errno::EAGAIN)).with_command("sleep 1 & sleep 2");
        let json = report.to_json();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["error_code"], "FORK_FAILED");
        assert_eq!(value["exit_code"], 1);
        assert_eq!(value["command"], "sleep 1 & sleep 2");
    }

    #[test]
    fn test_report_text() {
        let report = ErrorReport::new("TEST_ERROR", "Test message", 42);
        assert_eq!(report.render(ErrorFormat::Text), "minish: Test message");
        let report = report.with_command("ls");
        assert_eq!(report.to_text(), "minish: ls: Test message");
    }

    #[test]
    fn test_json_omits_missing_command() {
        let report = ErrorReport::new("TEST_ERROR", "Test message", 1);
        assert!(!report.to_json().contains("command"));
    }
}
