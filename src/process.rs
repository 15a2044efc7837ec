//! Blocking external command execution.
//!
//! Tools are judged by exit status alone. Output is captured so a failure
//! can carry stderr into its diagnostic, but it is never parsed for meaning.

use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, ExitStatus};

use log::debug;

use crate::error::{ImageBuildError, Result};

/// Captured outcome of a finished command.
#[derive(Debug)]
pub struct CommandResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Builder for one external tool invocation.
#[derive(Debug)]
pub struct Cmd {
    program: String,
    command: Command,
    error_msg: Option<String>,
    allow_fail: bool,
}

impl Cmd {
    /// `program` is looked up on PATH unless it is a path.
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        let program = program.as_ref();
        let name = Path::new(program)
            .file_name()
            .unwrap_or(program)
            .to_string_lossy()
            .into_owned();
        Self {
            program: name,
            command: Command::new(program),
            error_msg: None,
            allow_fail: false,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.command.arg(arg);
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.command.args(args);
        self
    }

    pub fn arg_path(mut self, path: &Path) -> Self {
        self.command.arg(path);
        self
    }

    pub fn env(mut self, key: &str, value: impl AsRef<OsStr>) -> Self {
        self.command.env(key, value);
        self
    }

    /// Message used in place of the default when the command fails.
    pub fn error_msg(mut self, msg: impl Into<String>) -> Self {
        self.error_msg = Some(msg.into());
        self
    }

    /// Return a non-zero exit as a result instead of an error.
    pub fn allow_fail(mut self) -> Self {
        self.allow_fail = true;
        self
    }

    pub fn run(mut self) -> Result<CommandResult> {
        debug!("running {:?}", self.command);
        let output = self.command.output().map_err(|err| {
            ImageBuildError::tool(
                &self.program,
                format!("could not start '{}': {}", self.program, err),
            )
        })?;

        let result = CommandResult {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if result.success() || self.allow_fail {
            return Ok(result);
        }

        let mut message = self
            .error_msg
            .unwrap_or_else(|| format!("exited with {}", result.status));
        let stderr = result.stderr.trim();
        if !stderr.is_empty() {
            message.push_str(": ");
            message.push_str(stderr.lines().last().unwrap_or(stderr));
        }
        Err(ImageBuildError::tool(self.program, message))
    }
}

/// Check whether a program can be found on PATH.
pub fn exists(program: &str) -> bool {
    which::which(program).is_ok()
}
