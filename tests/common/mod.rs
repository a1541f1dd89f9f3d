// tests/common/mod.rs
#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use kube_certs::cert::{CertificateGenerator, CredentialPair, OpenSslGenerator, SignedCertRequest};
use kube_certs::command::{CommandRunner, CopyableFile, RunResult};
use kube_certs::config::{ClusterConfig, LocalPaths, NodeConfig, Transport};
use kube_certs::error::CertError;
use tempfile::TempDir;

/// Guest filesystem rooted in a temp dir. Shell commands are recorded and
/// succeed; the guest has no openssl and cannot read kubeadm certs.
pub struct FakeGuest {
    pub root: PathBuf,
    pub commands: Vec<String>,
}

impl FakeGuest {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            commands: Vec::new(),
        }
    }

    pub fn path(&self, guest_path: &str) -> PathBuf {
        self.root.join(guest_path.trim_start_matches('/'))
    }

    pub fn mode(&self, guest_path: &str) -> u32 {
        fs::metadata(self.path(guest_path))
            .map(|m| m.permissions().mode() & 0o777)
            .unwrap_or(0)
    }
}

impl CommandRunner for FakeGuest {
    fn run_cmd(&mut self, argv: &[&str]) -> Result<RunResult, CertError> {
        self.commands.push(argv.join(" "));
        let exit_code = match argv.first() {
            Some(&"openssl") => 127,
            Some(&"cat") => 1,
            _ => 0,
        };
        RunResult {
            args: argv.iter().map(|a| a.to_string()).collect(),
            exit_code: Some(exit_code),
            ..RunResult::default()
        }
        .into_result()
    }

    fn copy(&mut self, asset: &mut dyn CopyableFile) -> Result<(), CertError> {
        let dst = self.path(&asset.target_path());
        let data = asset
            .contents()
            .map_err(|e| CertError::io("read asset", e))?;
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent).map_err(|e| CertError::io("mkdir", e))?;
        }
        fs::write(&dst, data).map_err(|e| CertError::io("write", e))?;
        let mode = u32::from_str_radix(asset.permissions(), 8)
            .map_err(|e| CertError::config(e.to_string()))?;
        fs::set_permissions(&dst, fs::Permissions::from_mode(mode))
            .map_err(|e| CertError::io("chmod", e))?;
        Ok(())
    }
}

#[path = "../../src/cert/counting.rs"]
mod counting;

pub use counting::CountingGenerator;

pub struct Env {
    pub dir: TempDir,
    pub paths: LocalPaths,
    pub config: ClusterConfig,
}

impl Env {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let paths = LocalPaths::new(dir.path().join(".minikube"));
        let mut config = ClusterConfig::default();
        config.remote.transport = Transport::Local;
        config.nodes = vec![
            NodeConfig {
                name: "minikube".to_string(),
                ip: "192.168.49.2".to_string(),
                port: 8443,
                control_plane: true,
            },
            NodeConfig {
                name: "minikube-m02".to_string(),
                ip: "192.168.49.3".to_string(),
                port: 8443,
                control_plane: false,
            },
        ];
        Self { dir, paths, config }
    }

    pub fn guest(&self, name: &str) -> FakeGuest {
        let root = self.dir.path().join("guests").join(name);
        fs::create_dir_all(&root).unwrap();
        FakeGuest::new(&root)
    }

    pub fn node(&self, name: &str) -> NodeConfig {
        self.config.node(name).cloned().unwrap()
    }
}
