// Library interface for minish
// The binary, benchmarks and tests all drive the executor through here

pub mod ast;
pub mod builtins;
pub mod config;
pub mod error;
pub mod executor;

pub use ast::{CommandNode, IoMode, Operator, SimpleCommand, Word, WordPart};
pub use executor::{ExitStatus, Executor};
