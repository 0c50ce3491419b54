// src/exec/shell.rs

//! Multi-command execution through one persistent `bash` process.
//!
//! Some external tools only make sense as a *sequence* of shell commands
//! sharing state: `cmsenv` and `scram` mutate the environment, and the CMS
//! setup script defines aliases that later commands rely on. A plain
//! one-command-per-process runner cannot express that, so [`ShellSession`]
//! feeds all commands into a single `bash` via stdin instead.

use anyhow::Context;
use tracing::{debug, error, info};

use crate::errors::{Error, Result};
use crate::exec::command::drain_reader;

/// A sequence of shell commands run in one `bash` process.
///
/// The session starts with `set -e`, so execution stops at the first failing
/// command (remaining input is still written but never executed). Directory
/// changes, sourced scripts and exported variables carry across commands.
#[derive(Debug, Clone, Default)]
pub struct ShellSession {
    commands: Vec<String>,
    dry: bool,
}

impl ShellSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one command line to the session.
    pub fn cmd(mut self, command: impl Into<String>) -> Self {
        self.commands.push(command.into());
        self
    }

    /// Append several command lines to the session.
    pub fn cmds<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.commands.extend(commands.into_iter().map(Into::into));
        self
    }

    /// In dry mode the commands are logged but bash is never spawned.
    pub fn dry(mut self, dry: bool) -> Self {
        self.dry = dry;
        self
    }

    /// Run the session to completion, returning the combined output lines.
    ///
    /// A non-zero exit of the bash process is reported as
    /// [`Error::CommandFailed`] carrying the last command that was sent.
    pub fn run(&self) -> Result<Vec<String>> {
        info!("sending {} commands to a bash session", self.commands.len());
        for command in &self.commands {
            debug!("  {command}");
        }
        if self.dry {
            info!("dry mode, not running commands");
            return Ok(Vec::new());
        }

        let mut script = String::from("set -e\n");
        for command in &self.commands {
            script.push_str(command);
            script.push('\n');
        }

        let reader = duct::cmd!("bash")
            .stdin_bytes(script.into_bytes())
            .stderr_to_stdout()
            .unchecked()
            .reader()
            .context("spawning bash for a shell session")?;

        let (code, lines) = drain_reader(reader, "bash session")?;
        if code == 0 {
            info!("shell session exited with status 0");
            Ok(lines)
        } else {
            let last = self
                .commands
                .last()
                .map(String::as_str)
                .unwrap_or("bash session");
            error!(code, "shell session failed around `{last}`");
            Err(Error::CommandFailed {
                command: last.to_string(),
                code,
            })
        }
    }
}
