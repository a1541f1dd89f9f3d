// config/types.rs
use serde::{Deserialize, Serialize};
use std::{fs, io, net::IpAddr, path::Path};
use url::Url;

use super::paths::DEFAULT_BIND_IPV4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    Ssh,
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub transport: Transport,
    pub user: String,
    pub ssh_key_path: String,
    pub ssh_port: u16,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            transport: Transport::Ssh,
            user: "docker".to_string(),
            ssh_key_path: "~/.ssh/id_rsa".to_string(),
            ssh_port: 22,
        }
    }
}

impl RemoteConfig {
    pub fn expanded_key_path(&self) -> String {
        shellexpand::tilde(&self.ssh_key_path).to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub name: String,
    pub ip: String,
    #[serde(default = "default_apiserver_port")]
    pub port: u16,
    #[serde(default)]
    pub control_plane: bool,
}

fn default_apiserver_port() -> u16 {
    8443
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub cluster_name: String,
    pub kubernetes_version: String,
    pub service_cidr: String,
    pub dns_domain: String,
    pub apiserver_name: String,
    pub apiserver_names: Vec<String>,
    pub apiserver_ips: Vec<IpAddr>,
    pub container_runtime: String,
    pub cert_expiration_hours: i64,
    pub nodes: Vec<NodeConfig>,
    pub remote: RemoteConfig,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            cluster_name: "minikube".to_string(),
            kubernetes_version: "v1.31.0".to_string(),
            service_cidr: "10.96.0.0/12".to_string(),
            dns_domain: "cluster.local".to_string(),
            apiserver_name: "minikubeCA".to_string(),
            apiserver_names: Vec::new(),
            apiserver_ips: Vec::new(),
            container_runtime: "docker".to_string(),
            cert_expiration_hours: 26280,
            nodes: Vec::new(),
            remote: RemoteConfig::default(),
        }
    }
}

impl ClusterConfig {
    pub fn load_from_file(path: &str) -> io::Result<Self> {
        let config_str = fs::read_to_string(path)?;
        serde_json::from_str(&config_str).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    pub fn save_to_file(&self, path: &str) -> io::Result<()> {
        let config_str = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, config_str)
    }

    pub fn validate(&self) -> io::Result<()> {
        if self.cluster_name.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "cluster_name must not be empty",
            ));
        }
        if self.cert_expiration_hours <= 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "cert_expiration_hours must be positive, got {}",
                    self.cert_expiration_hours
                ),
            ));
        }
        for node in &self.nodes {
            if node.ip.parse::<IpAddr>().is_err() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("node {} has invalid IP: {}", node.name, node.ip),
                ));
            }
        }
        if self.remote.transport == Transport::Ssh
            && !Path::new(&self.remote.expanded_key_path()).exists()
        {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("SSH key not found at: {}", self.remote.ssh_key_path),
            ));
        }
        Ok(())
    }

    pub fn cert_expiration(&self) -> chrono::Duration {
        chrono::Duration::hours(self.cert_expiration_hours)
    }

    pub fn node(&self, name: &str) -> Option<&NodeConfig> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn control_plane(&self) -> Option<&NodeConfig> {
        self.nodes.iter().find(|n| n.control_plane)
    }
}

/// Host the container runtime daemon is reachable on. Only docker honors a
/// `tcp://` `DOCKER_HOST`; everything else listens on the default bind address.
pub fn daemon_host(container_runtime: &str, docker_host: Option<&str>) -> String {
    if container_runtime != "docker" {
        return DEFAULT_BIND_IPV4.to_string();
    }
    docker_host
        .and_then(|raw| Url::parse(raw).ok())
        .filter(|url| url.scheme() == "tcp")
        .and_then(|url| url.host_str().map(|h| h.trim_matches(['[', ']']).to_string()))
        .unwrap_or_else(|| DEFAULT_BIND_IPV4.to_string())
}
