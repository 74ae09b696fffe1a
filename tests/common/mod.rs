#![allow(dead_code)]

use minish::{CommandNode, SimpleCommand};
use std::path::Path;
use std::process::{Command, Output};

/// Run a command tree through the minish binary with `dir` as working
/// directory and HOME, so no user rc file leaks in.
pub fn run_tree(tree: &CommandNode, dir: &Path) -> Output {
    run_tree_with(tree, dir, &[], &[])
}

pub fn run_tree_with(
    tree: &CommandNode,
    dir: &Path,
    flags: &[&str],
    envs: &[(&str, &str)],
) -> Output {
    let json = serde_json::to_string(tree).expect("tree serializes");
    run_json(&json, dir, flags, envs)
}

pub fn run_json(json: &str, dir: &Path, flags: &[&str], envs: &[(&str, &str)]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_minish"))
        .args(flags)
        .arg("-c")
        .arg(json)
        .current_dir(dir)
        .env("HOME", dir)
        .env_remove("MINISH_ERROR_FORMAT")
        .env_remove("MINISH_SIGNAL_STATUS")
        .envs(envs.iter().copied())
        .output()
        .expect("Failed to execute minish")
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// `sh -c <script>`
pub fn sh(script: &str) -> SimpleCommand {
    SimpleCommand::new("sh").arg("-c").arg(script)
}

pub fn cmd(verb: &str, args: &[&str]) -> SimpleCommand {
    SimpleCommand::new(verb).args(args.iter().copied())
}
