// src/cert/operations.rs
use std::path::{Path, PathBuf};

use super::ca::{generate_shared_ca_certs, CaStore};
use super::kubeadm::refresh_kubeadm_certs;
use super::openssl::CertificateGenerator;
use super::profile::{generate_profile_certs, ProfileCerts, ProfileRequest};
use super::types::Renewal;
use crate::command::{CommandRunner, MemoryAsset, TransferManifest};
use crate::config::paths::{GUEST_KUBERNETES_CERTS_DIR, GUEST_PERSISTENT_DIR};
use crate::config::{ClusterConfig, LocalPaths, NodeConfig};
use crate::error::{CertError, ResultExt};
use crate::kubeconfig::{guest_kubeconfig, KUBECONFIG_NAME};
use crate::truststore::{collect_ca_certs, install_cert_symlinks, TrustStoreEntry};
use crate::utils::logging::Logger;

/// What one `setup_certs` run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupReport {
    pub ca_regenerated: bool,
    pub profile: ProfileCerts,
    /// Guest paths of every file copied, in copy order.
    pub copied: Vec<String>,
    pub trust_store: Vec<TrustStoreEntry>,
    pub kubeadm: Renewal,
}

pub struct CertificateOperations {
    logger: Box<dyn Logger>,
    generator: Box<dyn CertificateGenerator>,
    paths: LocalPaths,
    ca_store: CaStore,
    daemon_host: String,
}

impl CertificateOperations {
    pub fn new(
        logger: Box<dyn Logger>,
        generator: Box<dyn CertificateGenerator>,
        paths: LocalPaths,
        daemon_host: String,
    ) -> Self {
        let ca_store = CaStore::new(&paths);
        Self {
            logger,
            generator,
            paths,
            ca_store,
            daemon_host,
        }
    }

    pub fn with_ca_store(mut self, ca_store: CaStore) -> Self {
        self.ca_store = ca_store;
        self
    }

    pub fn log(&mut self, message: &str) {
        self.logger.log(message);
    }

    pub fn debug_log(&mut self, message: &str) {
        self.logger.debug_log(message);
    }

    /// Provisions every credential `node` needs and installs it through
    /// `runner`. Any failure aborts the remaining steps.
    pub fn setup_certs(
        &mut self,
        runner: &mut dyn CommandRunner,
        config: &ClusterConfig,
        node: &NodeConfig,
    ) -> Result<SetupReport, CertError> {
        self.log(&format!(
            "Setting up {} for IP: {}",
            self.paths.profile(&config.cluster_name).display(),
            node.ip
        ));

        let ca = generate_shared_ca_certs(&self.ca_store, self.generator.as_ref(), self.logger.as_mut())
            .context("shared CA certs")?;

        let request = ProfileRequest {
            config,
            node,
            paths: &self.paths,
            daemon_host: &self.daemon_host,
        };
        let profile = generate_profile_certs(&request, &ca, self.generator.as_ref(), self.logger.as_mut())
            .context("profile certs")?;

        let mut xfer: Vec<PathBuf> = profile.transfer.clone();
        for pair in [&ca.certs.ca, &ca.certs.proxy] {
            xfer.push(pair.cert.clone());
            xfer.push(pair.key.clone());
        }

        let mut manifest = TransferManifest::new();
        let result = self.transfer(runner, node, &xfer, &mut manifest);
        manifest.close_all(self.logger.as_mut());
        let (copied, trust_store) = result?;

        install_cert_symlinks(runner, &trust_store, self.logger.as_mut())
            .context("certificate symlinks")?;

        let kubeadm = refresh_kubeadm_certs(runner, config, self.logger.as_mut())?;

        Ok(SetupReport {
            ca_regenerated: ca.regenerated,
            profile,
            copied,
            trust_store,
            kubeadm,
        })
    }

    /// Opens every asset into `manifest` before copying any of them, so the
    /// caller can close whatever was opened no matter where this fails.
    fn transfer(
        &mut self,
        runner: &mut dyn CommandRunner,
        node: &NodeConfig,
        xfer: &[PathBuf],
        manifest: &mut TransferManifest,
    ) -> Result<(Vec<String>, Vec<TrustStoreEntry>), CertError> {
        for path in xfer {
            let name = file_name(path);
            let perms = if name.ends_with(".key") { "0600" } else { "0644" };
            manifest
                .push_file(path, GUEST_KUBERNETES_CERTS_DIR, &name, perms)
                .map_err(|e| CertError::io(format!("key asset {}", name), e))?;
        }

        let trust_store = collect_ca_certs(&self.paths, self.logger.as_mut())?;
        for entry in &trust_store {
            manifest
                .push_file(&entry.source, entry.target_dir(), entry.target_name(), "0644")
                .map_err(|e| CertError::io(format!("ca asset {}", entry.source.display()), e))?;
        }

        if node.control_plane {
            let data = guest_kubeconfig(node).context("encoding kubeconfig")?;
            manifest.push(Box::new(MemoryAsset::new(
                data,
                GUEST_PERSISTENT_DIR,
                KUBECONFIG_NAME,
                "0644",
            )));
        }

        let copied = manifest.copy_all(runner, self.logger.as_mut())?;
        Ok((copied, trust_store))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
