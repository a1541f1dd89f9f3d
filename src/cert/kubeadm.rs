// src/cert/kubeadm.rs
use super::types::Renewal;
use super::verification::is_kubeadm_cert_valid;
use crate::command::CommandRunner;
use crate::config::paths::{GUEST_KUBERNETES_CERTS_DIR, GUEST_PERSISTENT_DIR, KUBEADM_YAML_PATH};
use crate::config::ClusterConfig;
use crate::error::CertError;
use crate::utils::logging::Logger;

/// Certificates kubeadm issues on the control plane itself.
pub const KUBEADM_CERTS: [&str; 6] = [
    "apiserver-etcd-client",
    "apiserver-kubelet-client",
    "etcd-server",
    "etcd-healthcheck-client",
    "etcd-peer",
    "front-proxy-client",
];

/// Guest path of a kubeadm certificate: `etcd-server` lives at `etcd/server.crt`.
pub fn kubeadm_cert_path(name: &str) -> String {
    match name.strip_prefix("etcd-") {
        Some(rest) => format!("{}/etcd/{}.crt", GUEST_KUBERNETES_CERTS_DIR, rest),
        None => format!("{}/{}.crt", GUEST_KUBERNETES_CERTS_DIR, name),
    }
}

pub fn renew_command(kubernetes_version: &str) -> String {
    let binaries = format!("{}/binaries/{}", GUEST_PERSISTENT_DIR, kubernetes_version);
    format!(
        "sudo env PATH=\"{}:$PATH\" kubeadm certs renew all --config {}",
        binaries, KUBEADM_YAML_PATH
    )
}

/// Renews all kubeadm certificates when any of them is expired or corrupt.
/// Issues no command at all when every certificate is fine.
pub fn refresh_kubeadm_certs(
    runner: &mut dyn CommandRunner,
    config: &ClusterConfig,
    logger: &mut dyn Logger,
) -> Result<Renewal, CertError> {
    let mut needs_refresh = false;
    for name in KUBEADM_CERTS {
        if !is_kubeadm_cert_valid(runner, &kubeadm_cert_path(name), logger) {
            needs_refresh = true;
        }
    }
    if !needs_refresh {
        return Ok(Renewal::Reused);
    }

    logger.warn("kubeadm certificates have expired. Generating new ones...");
    let script = renew_command(&config.kubernetes_version);
    runner
        .run_cmd(&["/bin/bash", "-c", &script])
        .map_err(|e| e.wrap("failed to renew kubeadm certs"))?;
    Ok(Renewal::Regenerated)
}
