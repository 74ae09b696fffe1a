use crate::ast::{Word, WordPart};
use crate::error::ExecError;
use crate::executor::ExitStatus;
use log::debug;
use std::env;

/// Split a `NAME=VALUE` verb into its name and the word expression for its
/// value.
///
/// The name is the literal text before the first `=`; a variable reference
/// ahead of that `=` means the verb is not an assignment.
pub fn split_assignment(verb: &Word) -> Option<(String, Word)> {
    let parts = verb.parts();
    let mut name = String::new();

    for (i, part) in parts.iter().enumerate() {
        let WordPart::Literal(text) = part else {
            return None;
        };

        match text.split_once('=') {
            Some((head, tail)) => {
                name.push_str(head);

                let mut value = Vec::with_capacity(parts.len() - i);
                if !tail.is_empty() {
                    value.push(WordPart::Literal(tail.to_string()));
                }
                value.extend(parts[i + 1..].iter().cloned());

                return Some((name, Word::new(value)));
            }
            None => name.push_str(text),
        }
    }

    None
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub(super) fn builtin_assign(name: &str, value: &Word) -> Result<ExitStatus, ExecError> {
    if !is_valid_name(name) {
        eprintln!("minish: `{}': not a valid identifier", name);
        return Ok(ExitStatus::FAILURE);
    }

    let value = value.resolve().unwrap_or_default();
    if value.contains('\0') {
        eprintln!("minish: {}: value contains a NUL byte", name);
        return Ok(ExitStatus::FAILURE);
    }

    debug!("{}={}", name, value);
    env::set_var(name, value);
    Ok(ExitStatus::SUCCESS)
}
