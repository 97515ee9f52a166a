//! External helper commands (people search, Drive metadata).
//!
//! A command is configured as an argv list. `argv[0]` is resolved through
//! `PATH`; every `{placeholder}` in the remaining arguments is replaced per
//! call, and without a placeholder the value is appended.

use std::process::Stdio;

use tokio::process::Command;

use crate::people::LookupError;

#[derive(Debug, Clone)]
pub struct ExternalCommand {
    argv: Vec<String>,
    placeholder: &'static str,
}

impl ExternalCommand {
    /// `None` when `argv` is empty or names no program.
    pub fn new(argv: Vec<String>, placeholder: &'static str) -> Option<Self> {
        if argv.first().is_none_or(|program| program.trim().is_empty()) {
            return None;
        }
        Some(ExternalCommand { argv, placeholder })
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub(crate) fn args_for(&self, value: &str) -> Vec<String> {
        let rest = &self.argv[1..];
        let mut args: Vec<String> = rest
            .iter()
            .map(|arg| arg.replace(self.placeholder, value))
            .collect();

        if !rest.iter().any(|arg| arg.contains(self.placeholder)) {
            args.push(value.to_string());
        }
        args
    }

    /// Run for `value` and return stdout. A non-zero exit is a failure.
    pub async fn run(&self, value: &str) -> Result<String, LookupError> {
        let program = which::which(self.program()).map_err(|_| {
            LookupError::Failed(format!("Command '{}' not found in PATH", self.program()))
        })?;

        let output = Command::new(&program)
            .args(self.args_for(value))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| LookupError::Failed(format!("Failed to run {}: {}", program.display(), e)))?;

        if !output.status.success() {
            return Err(LookupError::Failed(format!(
                "{} exited with status: {}",
                self.program(),
                output.status.code().unwrap_or(-1)
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
