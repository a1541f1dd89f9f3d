// config/paths.rs
use std::{
    env,
    path::{Path, PathBuf},
};

/// Guest directory that persists across restarts.
pub const GUEST_PERSISTENT_DIR: &str = "/var/lib/minikube";
pub const GUEST_KUBERNETES_CERTS_DIR: &str = "/var/lib/minikube/certs";
/// Guest directory holding trust entries normalized to `.pem`.
pub const GUEST_CERT_AUTH_DIR: &str = "/usr/share/ca-certificates";
/// Guest directory holding direct and `<hash>.0` symlinks.
pub const GUEST_CERT_STORE_DIR: &str = "/etc/ssl/certs";
pub const KUBEADM_YAML_PATH: &str = "/var/tmp/minikube/kubeadm.yaml";

pub const CONTROL_PLANE_ALIAS: &str = "control-plane.minikube.internal";
pub const DEFAULT_BIND_IPV4: &str = "127.0.0.1";

pub const MINIKUBE_HOME_ENV: &str = "MINIKUBE_HOME";

/// Host-side layout: one global directory shared by every profile (the CA
/// pairs and their lock marker) and one directory per profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalPaths {
    root: PathBuf,
}

impl LocalPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `$MINIKUBE_HOME` (or `$MINIKUBE_HOME/.minikube` if it exists), else
    /// `~/.minikube`.
    pub fn from_env() -> Self {
        if let Ok(home) = env::var(MINIKUBE_HOME_ENV) {
            let home = PathBuf::from(shellexpand::tilde(&home).to_string());
            let nested = home.join(".minikube");
            return Self::new(if nested.is_dir() { nested } else { home });
        }
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(home.join(".minikube"))
    }

    pub fn mini_path(&self) -> &Path {
        &self.root
    }

    pub fn profile(&self, cluster: &str) -> PathBuf {
        self.root.join("profiles").join(cluster)
    }

    pub fn ca_cert(&self) -> PathBuf {
        self.root.join("ca.crt")
    }

    pub fn ca_key(&self) -> PathBuf {
        self.root.join("ca.key")
    }

    pub fn proxy_ca_cert(&self) -> PathBuf {
        self.root.join("proxy-client-ca.crt")
    }

    pub fn proxy_ca_key(&self) -> PathBuf {
        self.root.join("proxy-client-ca.key")
    }

    /// Lock marker serializing CA generation across concurrent processes.
    pub fn ca_lock(&self) -> PathBuf {
        self.root.join("ca-certs")
    }

    pub fn client_cert(&self, cluster: &str) -> PathBuf {
        self.profile(cluster).join("client.crt")
    }

    pub fn client_key(&self, cluster: &str) -> PathBuf {
        self.profile(cluster).join("client.key")
    }

    /// User-supplied CA directories mirrored into the guest trust store.
    pub fn trust_scan_dirs(&self) -> [PathBuf; 2] {
        [
            self.root.join("certs"),
            self.root.join("files").join("etc").join("ssl").join("certs"),
        ]
    }

    pub fn log_file(&self) -> PathBuf {
        self.root.join("logs").join("certs.log")
    }
}
