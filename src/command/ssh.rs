// src/command/ssh.rs
use std::{
    io::Write,
    process::{Command, Stdio},
};

use uuid::Uuid;

use super::{run_sudo_bash, shell_quote, CommandRunner, CopyableFile, RunResult};
use crate::config::RemoteConfig;
use crate::error::CertError;

/// Runs commands on a guest over the `ssh` client.
#[derive(Debug, Clone)]
pub struct SshRunner {
    host: String,
    user: String,
    key_path: String,
    port: u16,
}

impl SshRunner {
    pub fn new(host: &str, remote: &RemoteConfig) -> Self {
        Self {
            host: host.to_string(),
            user: remote.user.clone(),
            key_path: remote.expanded_key_path(),
            port: remote.ssh_port,
        }
    }

    fn ssh(&self) -> Command {
        let mut cmd = Command::new("ssh");
        cmd.args([
            "-i",
            &self.key_path,
            "-p",
            &self.port.to_string(),
            "-o",
            "BatchMode=yes",
            "-o",
            "ConnectTimeout=5",
            "-o",
            "StrictHostKeyChecking=no",
            &format!("{}@{}", self.user, self.host),
        ]);
        cmd
    }

    fn run_with_stdin(&mut self, script: &str, stdin: &[u8]) -> Result<RunResult, CertError> {
        let context = || format!("ssh {}: {}", self.host, script);
        let mut child = self
            .ssh()
            .arg(script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CertError::io(context(), e))?;

        if let Some(mut pipe) = child.stdin.take() {
            pipe.write_all(stdin).map_err(|e| CertError::io(context(), e))?;
        }
        let output = child
            .wait_with_output()
            .map_err(|e| CertError::io(context(), e))?;

        RunResult {
            args: vec![script.to_string()],
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.status.code(),
        }
        .into_result()
    }
}

impl CommandRunner for SshRunner {
    fn run_cmd(&mut self, argv: &[&str]) -> Result<RunResult, CertError> {
        let script = argv
            .iter()
            .map(|a| shell_quote(a))
            .collect::<Vec<_>>()
            .join(" ");
        let output = self
            .ssh()
            .arg(&script)
            .output()
            .map_err(|e| CertError::io(format!("ssh {}: {}", self.host, script), e))?;

        RunResult {
            args: argv.iter().map(|a| a.to_string()).collect(),
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.status.code(),
        }
        .into_result()
    }

    fn copy(&mut self, asset: &mut dyn CopyableFile) -> Result<(), CertError> {
        // Stage in /tmp as the login user, then move into place with sudo.
        let temp_file = format!("/tmp/cert_{}", Uuid::new_v4());
        let data = asset
            .contents()
            .map_err(|e| CertError::io(format!("read {}", asset.source_path().display()), e))?;
        self.run_with_stdin(&format!("cat > {}", shell_quote(&temp_file)), &data)?;

        let target = asset.target_path();
        let install = format!(
            "mkdir -p {dir} && mv {tmp} {dst} && chown root:root {dst} && chmod {mode} {dst}",
            dir = shell_quote(asset.target_dir()),
            tmp = shell_quote(&temp_file),
            dst = shell_quote(&target),
            mode = shell_quote(asset.permissions()),
        );
        if let Err(e) = run_sudo_bash(self, &install) {
            let _ = self.run_cmd(&["rm", "-f", &temp_file]);
            return Err(e);
        }
        Ok(())
    }
}
