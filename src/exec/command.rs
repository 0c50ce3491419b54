// src/exec/command.rs

use std::fmt;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, anyhow};
use duct::ReaderHandle;
use tracing::{error, info};

use crate::errors::{Error, Result};
use crate::logging::SUBPROCESS_TARGET;

/// A single external command, built up and then run to completion.
///
/// Stderr is merged into stdout and every line is re-logged under the
/// subprocess target as it arrives, so long-running tools remain visible in
/// the log. On exit code 0 the captured lines are returned; any other exit
/// code becomes [`Error::CommandFailed`].
#[derive(Debug, Clone)]
pub struct Cmd {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    env: Vec<(String, String)>,
    dry: bool,
}

impl Cmd {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
            dry: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Working directory for the child process.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Add an environment variable for the child process.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// In dry mode the command is logged but never spawned.
    pub fn dry(mut self, dry: bool) -> Self {
        self.dry = dry;
        self
    }

    /// Run the command, returning its output lines on exit code 0.
    pub fn run(&self) -> Result<Vec<String>> {
        let (code, lines) = self.run_unchecked()?;
        if code == 0 {
            info!(cmd = %self, "command exited with status 0");
            Ok(lines)
        } else {
            error!(cmd = %self, code, "command failed");
            Err(Error::CommandFailed {
                command: self.to_string(),
                code,
            })
        }
    }

    /// Run the command and return `(exit_code, output_lines)` without
    /// treating a non-zero exit as an error.
    ///
    /// Used for existence checks where the exit code *is* the answer.
    pub fn run_unchecked(&self) -> Result<(i32, Vec<String>)> {
        info!(cmd = %self, "issuing command");
        if self.dry {
            info!("dry mode, not running command");
            return Ok((0, Vec::new()));
        }

        let mut expr = duct::cmd(self.program.as_str(), &self.args)
            .stderr_to_stdout()
            .unchecked();
        if let Some(dir) = &self.cwd {
            expr = expr.dir(dir);
        }
        for (key, value) in &self.env {
            expr = expr.env(key, value);
        }

        let reader = expr
            .reader()
            .with_context(|| format!("spawning `{self}`"))?;
        drain_reader(reader, &self.to_string())
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " '{arg}'")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Run a full argv (`["git", "rev-parse", ...]`), returning output lines on
/// exit code 0.
pub fn run_command<I, S>(argv: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut argv = argv.into_iter().map(Into::into);
    let program = argv
        .next()
        .ok_or_else(|| anyhow!("run_command called with an empty argv"))?;
    Cmd::new(program).args(argv).run()
}

/// Read a child's merged output to EOF, re-logging each line, then collect
/// the exit code.
pub(crate) fn drain_reader(reader: ReaderHandle, display: &str) -> Result<(i32, Vec<String>)> {
    let mut lines = Vec::new();
    let mut buf = BufReader::new(reader);
    let mut line = String::new();
    loop {
        line.clear();
        let n = buf
            .read_line(&mut line)
            .with_context(|| format!("reading output of `{display}`"))?;
        if n == 0 {
            break;
        }
        let stripped = line.trim_end_matches(['\n', '\r']);
        info!(target: SUBPROCESS_TARGET, "{stripped}");
        lines.push(stripped.to_string());
    }

    let reader = buf.into_inner();
    let status = reader
        .try_wait()
        .with_context(|| format!("collecting exit status of `{display}`"))?
        .ok_or_else(|| anyhow!("`{display}` has no exit status after EOF"))?
        .status;

    Ok((status.code().unwrap_or(-1), lines))
}
