//! Configuration for the executor
//!
//! Settings are read from `~/.minishrc`, then overridden by the process
//! environment:
//! - MINISH_ERROR_FORMAT (text, json)
//! - MINISH_SIGNAL_STATUS (shell, lossy)

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// How internal errors are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorFormat {
    #[default]
    Text,
    Json,
}

impl ErrorFormat {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => ErrorFormat::Json,
            _ => ErrorFormat::Text,
        }
    }
}

/// How a child killed by a signal is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignalStatus {
    /// 128 + signal number
    #[default]
    Shell,
    /// Reported as a successful exit
    Lossy,
}

impl SignalStatus {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "lossy" => SignalStatus::Lossy,
            _ => SignalStatus::Shell,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Config {
    pub error_format: ErrorFormat,
    pub signal_status: SignalStatus,
}

impl Config {
    /// Load `~/.minishrc` and apply environment overrides
    pub fn load() -> Self {
        let mut config = Self::from_file(&Self::rc_path()).unwrap_or_default();
        config.apply_env();
        config
    }

    /// Get the path to .minishrc
    pub fn rc_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".minishrc")
    }

    /// Parse configuration from a specific file
    pub fn from_file(path: &Path) -> Option<Self> {
        let content = fs::read_to_string(path).ok()?;
        Some(Self::parse(&content))
    }

    /// Parse configuration from content string
    pub fn parse(content: &str) -> Self {
        let mut config = Config::default();

        for line in content.lines() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let line = line.strip_prefix("export ").unwrap_or(line);

            if let Some((key, value)) = parse_assignment(line) {
                config.set(&key, &unquote(&value));
            }
        }

        config
    }

    /// Override settings from MINISH_* environment variables
    pub fn apply_env(&mut self) {
        for key in ["MINISH_ERROR_FORMAT", "MINISH_SIGNAL_STATUS"] {
            if let Ok(value) = env::var(key) {
                self.set(key, &value);
            }
        }
    }

    fn set(&mut self, key: &str, value: &str) {
        match key {
            "MINISH_ERROR_FORMAT" => self.error_format = ErrorFormat::from_str(value),
            "MINISH_SIGNAL_STATUS" => self.signal_status = SignalStatus::from_str(value),
            _ => {}
        }
    }
}

/// Parse a shell variable assignment (KEY=value or KEY="value")
fn parse_assignment(line: &str) -> Option<(String, String)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();

    if key.is_empty() || !key.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }

    Some((key.to_string(), value.trim().to_string()))
}

/// Remove surrounding quotes from a value
fn unquote(s: &str) -> String {
    let s = s.trim();

    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return s[1..s.len() - 1].to_string();
        }
    }

    s.to_string()
}
