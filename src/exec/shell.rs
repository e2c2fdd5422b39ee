// src/exec/shell.rs

//! Shell resolution: `Shell` → interpreter invocation.

use std::fmt;

use crate::config::Shell;

/// Interpreter used for `Shell::Bash`.
pub const BASH: &str = "bash";

/// An interpreter invocation. The script file path is appended as the last
/// argument when the script runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    /// Arguments for running the script stored at `script_path`.
    pub fn args_for(&self, script_path: &str) -> Vec<String> {
        let mut args = self.args.clone();
        args.push(script_path.to_string());
        args
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Resolve a shell selection. Never fails: whether the interpreter exists is
/// only discovered when the process starts.
///
/// `Custom` strings are split on whitespace, so `"python3 -u"` runs
/// `python3` with `-u` before the script path.
pub fn resolve(shell: &Shell) -> Invocation {
    match shell {
        Shell::Bash => Invocation {
            program: BASH.to_string(),
            args: Vec::new(),
        },
        Shell::Custom(cmd) => {
            let mut parts = cmd.split_whitespace().map(str::to_string);
            let program = parts.next().unwrap_or_else(|| cmd.clone());
            Invocation {
                program,
                args: parts.collect(),
            }
        }
    }
}
