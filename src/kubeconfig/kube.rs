// src/kubeconfig/kube.rs
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::paths::GUEST_KUBERNETES_CERTS_DIR;
use crate::config::NodeConfig;
use crate::error::CertError;

/// File name of the kubeconfig placed in the guest persistent dir.
pub const KUBECONFIG_NAME: &str = "kubeconfig";

const EXTENSION_NAME: &str = "cluster_info";
const PROVIDER: &str = "minikube.sigs.k8s.io";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct KubeConfig {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub clusters: Vec<NamedCluster>,
    pub contexts: Vec<NamedContext>,
    pub current_context: String,
    pub preferences: serde_yaml::Mapping,
    pub users: Vec<NamedUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamedCluster {
    pub name: String,
    pub cluster: ClusterEntry,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ClusterEntry {
    pub server: String,
    pub certificate_authority: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<NamedExtension>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamedContext {
    pub name: String,
    pub context: ContextEntry,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextEntry {
    pub cluster: String,
    pub user: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<NamedExtension>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamedUser {
    pub name: String,
    pub user: UserEntry,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct UserEntry {
    pub client_certificate: String,
    pub client_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamedExtension {
    pub name: String,
    pub extension: ClusterInfo,
}

/// Provenance stamp attached to the cluster and context entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ClusterInfo {
    pub provider: String,
    pub version: String,
    pub last_update: String,
}

impl ClusterInfo {
    pub fn now() -> Self {
        Self {
            provider: PROVIDER.to_string(),
            version: format!("v{}", env!("CARGO_PKG_VERSION")),
            last_update: Utc::now().format("%a, %d %b %Y %H:%M:%S %Z").to_string(),
        }
    }

    fn extension(&self) -> Vec<NamedExtension> {
        vec![NamedExtension {
            name: EXTENSION_NAME.to_string(),
            extension: self.clone(),
        }]
    }
}

impl KubeConfig {
    /// Kubeconfig the control plane uses to reach its own API server with
    /// the serving certificate.
    pub fn for_guest(name: &str, port: u16, info: &ClusterInfo) -> Self {
        let certs = GUEST_KUBERNETES_CERTS_DIR;
        Self {
            api_version: "v1".to_string(),
            kind: "Config".to_string(),
            clusters: vec![NamedCluster {
                name: name.to_string(),
                cluster: ClusterEntry {
                    server: format!("https://localhost:{}", port),
                    certificate_authority: format!("{}/ca.crt", certs),
                    extensions: info.extension(),
                },
            }],
            contexts: vec![NamedContext {
                name: name.to_string(),
                context: ContextEntry {
                    cluster: name.to_string(),
                    user: name.to_string(),
                    extensions: info.extension(),
                },
            }],
            current_context: name.to_string(),
            preferences: serde_yaml::Mapping::new(),
            users: vec![NamedUser {
                name: name.to_string(),
                user: UserEntry {
                    client_certificate: format!("{}/apiserver.crt", certs),
                    client_key: format!("{}/apiserver.key", certs),
                },
            }],
        }
    }

    pub fn to_yaml(&self) -> Result<Vec<u8>, CertError> {
        Ok(serde_yaml::to_string(self)?.into_bytes())
    }
}

/// Serialized guest kubeconfig; the cluster, context and user are named after the node.
pub fn guest_kubeconfig(node: &NodeConfig) -> Result<Vec<u8>, CertError> {
    KubeConfig::for_guest(&node.name, node.port, &ClusterInfo::now()).to_yaml()
}
