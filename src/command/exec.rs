// src/command/exec.rs
use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use super::{CommandRunner, CopyableFile, RunResult};
use crate::error::CertError;

/// Runs commands on this machine. Copies land under `root` when set, which
/// keeps guest paths inside a sandbox directory.
#[derive(Debug, Default)]
pub struct ExecRunner {
    root: Option<PathBuf>,
}

impl ExecRunner {
    pub fn new() -> Self {
        Self { root: None }
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, guest_path: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(guest_path.trim_start_matches('/')),
            None => PathBuf::from(guest_path),
        }
    }
}

impl CommandRunner for ExecRunner {
    fn run_cmd(&mut self, argv: &[&str]) -> Result<RunResult, CertError> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| CertError::config("empty command"))?;

        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| CertError::io(format!("run {}", argv.join(" ")), e))?;

        RunResult {
            args: argv.iter().map(|a| a.to_string()).collect(),
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.status.code(),
        }
        .into_result()
    }

    fn copy(&mut self, asset: &mut dyn CopyableFile) -> Result<(), CertError> {
        let target = self.resolve(&asset.target_path());
        let label = asset_label(asset.source_path(), &target);
        let wrap = |e: std::io::Error| CertError::io(format!("copy {}", label), e);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(wrap)?;
        }
        let data = asset.contents().map_err(wrap)?;
        fs::write(&target, data).map_err(wrap)?;
        set_mode(&target, asset.permissions()).map_err(wrap)?;
        Ok(())
    }
}

fn asset_label(source: &Path, target: &Path) -> String {
    format!("{} -> {}", source.display(), target.display())
}

fn set_mode(path: &Path, mode: &str) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = u32::from_str_radix(mode, 8).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("mode {}: {}", mode, e))
        })?;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    }
    #[cfg(not(unix))]
    let _ = (path, mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::MemoryAsset;
    use tempfile::TempDir;

    #[test]
    fn copy_places_asset_under_root() -> Result<(), CertError> {
        let dir = TempDir::new().unwrap();
        let mut runner = ExecRunner::with_root(dir.path());
        let mut asset = MemoryAsset::new(b"apiVersion: v1".to_vec(), "/var/lib/minikube", "kubeconfig", "0644");
        runner.copy(&mut asset)?;

        let copied = dir.path().join("var/lib/minikube/kubeconfig");
        assert_eq!(fs::read(&copied).unwrap(), b"apiVersion: v1");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&copied).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o644);
        }
        Ok(())
    }

    #[test]
    fn non_zero_exit_is_an_error() {
        let mut runner = ExecRunner::new();
        let err = runner.run_cmd(&["/bin/sh", "-c", "echo oops >&2; exit 3"]).unwrap_err();
        match err {
            CertError::RemoteCommand { exit_code, stderr, .. } => {
                assert_eq!(exit_code, Some(3));
                assert_eq!(stderr.trim(), "oops");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
