//! Git subprocess bridge
//!
//! The three blocking operations the review session needs from version control.
//! Each one runs the `git` binary with a literal argument vector and captures
//! its standard output as UTF-8 text.

use log::debug;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed to run `git {command}`: {source}")]
    Spawn {
        command: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("`git {command}` exited with {status}: {stderr}")]
    Failed {
        command: &'static str,
        status: String,
        stderr: String,
    },
    #[error("`git {command}` produced non UTF-8 output: {source}")]
    Utf8 {
        command: &'static str,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

/// Version-control operations used by the review session.
pub trait VcsBridge {
    /// Full textual diff of the staged changes. An empty diff is not an error.
    fn fetch_diff(&self) -> Result<String, BridgeError>;

    /// Record a commit with `message` passed as a single argument.
    fn commit(&self, message: &str) -> Result<(), BridgeError>;

    /// The last log entry, shown as the commit confirmation.
    fn fetch_log(&self) -> Result<String, BridgeError>;
}

/// `VcsBridge` backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: OsString,
    workdir: Option<PathBuf>,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl GitCli {
    pub fn new() -> Self {
        Self {
            program: OsString::from("git"),
            workdir: None,
        }
    }

    /// Run every command inside `dir` instead of the process working directory.
    #[must_use]
    pub fn with_workdir(mut self, dir: &Path) -> Self {
        self.workdir = Some(dir.to_path_buf());
        self
    }

    /// Use another executable in place of `git`.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    fn run(&self, command: &'static str, args: &[&str]) -> Result<Output, BridgeError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }

        debug!("Executing git command: {cmd:?}");

        let output = cmd
            .output()
            .map_err(|source| BridgeError::Spawn { command, source })?;

        if output.status.success() {
            Ok(output)
        } else {
            Err(BridgeError::Failed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }

    fn stdout(command: &'static str, output: Output) -> Result<String, BridgeError> {
        String::from_utf8(output.stdout).map_err(|source| BridgeError::Utf8 { command, source })
    }
}

impl VcsBridge for GitCli {
    fn fetch_diff(&self) -> Result<String, BridgeError> {
        let output = self.run("diff --staged", &["diff", "--staged"])?;
        let diff = Self::stdout("diff --staged", output)?;
        debug!("Fetched staged diff ({} bytes)", diff.len());
        Ok(diff)
    }

    fn commit(&self, message: &str) -> Result<(), BridgeError> {
        self.run("commit", &["commit", "-m", message])?;
        debug!("Commit recorded");
        Ok(())
    }

    fn fetch_log(&self) -> Result<String, BridgeError> {
        let output = self.run("log -1", &["log", "-1"])?;
        Self::stdout("log -1", output)
    }
}
