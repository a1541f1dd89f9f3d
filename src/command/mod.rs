// src/command/mod.rs
mod assets;
mod exec;
mod manifest;
mod ssh;

pub use assets::{CopyableFile, FileAsset, MemoryAsset};
pub use exec::ExecRunner;
pub use manifest::TransferManifest;
pub use ssh::SshRunner;

use crate::error::CertError;

/// Captured output of one command on the execution target.
#[derive(Debug, Clone, Default)]
pub struct RunResult {
    pub args: Vec<String>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: Option<i32>,
}

impl RunResult {
    pub fn command(&self) -> String {
        self.args.join(" ")
    }

    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }

    /// stdout followed by stderr, for diagnostics.
    pub fn output(&self) -> String {
        let mut out = self.stdout_str();
        let err = self.stderr_str();
        if !err.is_empty() {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&err);
        }
        out
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Turns a non-zero exit into a `RemoteCommand` error.
    pub fn into_result(self) -> Result<RunResult, CertError> {
        if self.success() {
            return Ok(self);
        }
        Err(CertError::RemoteCommand {
            command: self.command(),
            exit_code: self.exit_code,
            stdout: self.stdout_str(),
            stderr: self.stderr_str(),
        })
    }
}

/// Execution target for every mutating step: an SSH session, a container
/// exec or the local shell.
pub trait CommandRunner {
    /// Runs `argv`; a non-zero exit status is an error carrying the output.
    fn run_cmd(&mut self, argv: &[&str]) -> Result<RunResult, CertError>;

    /// Places `asset` at its target path with its permission mode.
    fn copy(&mut self, asset: &mut dyn CopyableFile) -> Result<(), CertError>;
}

/// Runs `script` through `sudo /bin/bash -c`.
pub fn run_sudo_bash(runner: &mut dyn CommandRunner, script: &str) -> Result<RunResult, CertError> {
    runner.run_cmd(&["sudo", "/bin/bash", "-c", script])
}

/// Quotes `arg` for a POSIX shell when it contains anything but safe characters.
pub fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,@%+".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
