//! Builtins run inside the evaluating process: no child is created, so their
//! effects on the working directory and environment persist.

mod assign;

use crate::ast::{SimpleCommand, Word};
use crate::error::ExecError;
use crate::executor::redirect;
use crate::executor::ExitStatus;
use log::debug;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

pub use assign::split_assignment;

type BuiltinFn = fn(&SimpleCommand) -> Result<ExitStatus, ExecError>;

#[derive(Clone)]
pub struct Builtins {
    commands: HashMap<&'static str, BuiltinFn>,
}

impl Default for Builtins {
    fn default() -> Self {
        Self::new()
    }
}

impl Builtins {
    pub fn new() -> Self {
        let mut commands: HashMap<&'static str, BuiltinFn> = HashMap::new();

        commands.insert("cd", builtin_cd);
        commands.insert("exit", builtin_exit);
        commands.insert("quit", builtin_exit);

        Self { commands }
    }

    /// Run `cmd` as a builtin if `verb` names one or the verb is a
    /// `NAME=VALUE` assignment. `None` means the command is external.
    pub fn execute(
        &self,
        verb: &str,
        cmd: &SimpleCommand,
    ) -> Option<Result<ExitStatus, ExecError>> {
        if let Some(func) = self.commands.get(verb) {
            debug!("builtin {}", verb);
            return Some(func(cmd));
        }

        let (name, value) = split_assignment(&cmd.verb)?;
        Some(assign::builtin_assign(&name, &value))
    }
}

fn builtin_cd(cmd: &SimpleCommand) -> Result<ExitStatus, ExecError> {
    // Restores stderr when it goes out of scope at the end of the builtin
    let _stderr = match redirect::apply_for_cd(cmd) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("minish: {}", err);
            return Ok(ExitStatus::FAILURE);
        }
    };

    let Some(path) = cmd.params.first().and_then(Word::resolve) else {
        eprintln!("cd: missing directory operand");
        return Ok(ExitStatus::FAILURE);
    };

    let target = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => match dirs::home_dir() {
            Some(home) => home.join(rest.trim_start_matches('/')),
            None => PathBuf::from(&path),
        },
        _ => PathBuf::from(&path),
    };

    match env::set_current_dir(&target) {
        Ok(()) => {
            debug!("cwd is now {}", target.display());
            Ok(ExitStatus::SUCCESS)
        }
        Err(e) => {
            eprintln!("cd: {}: {}", path, e);
            Ok(ExitStatus::FAILURE)
        }
    }
}

fn builtin_exit(_cmd: &SimpleCommand) -> Result<ExitStatus, ExecError> {
    Ok(ExitStatus::Terminate)
}
