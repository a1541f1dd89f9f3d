// src/cert/ca.rs
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use super::lock::{with_lock, DEFAULT_LOCK_TIMEOUT};
use super::openssl::CertificateGenerator;
use super::types::{CaCerts, CaState, CertificateType, CredentialPair};
use super::verification::ensure_valid_or_regenerate;
use crate::config::LocalPaths;
use crate::error::{CertError, ResultExt};
use crate::utils::logging::Logger;

/// The CA pairs shared by every profile, guarded by one lock marker.
#[derive(Debug, Clone)]
pub struct CaStore {
    certs: CaCerts,
    lock_path: PathBuf,
    lock_timeout: Duration,
}

impl CaStore {
    pub fn new(paths: &LocalPaths) -> Self {
        Self {
            certs: CaCerts {
                ca: CredentialPair::new(paths.ca_cert(), paths.ca_key()),
                proxy: CredentialPair::new(paths.proxy_ca_cert(), paths.proxy_ca_key()),
            },
            lock_path: paths.ca_lock(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn certs(&self) -> &CaCerts {
        &self.certs
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    fn specs(&self) -> [(CertificateType, &'static str, &CredentialPair); 2] {
        [
            (CertificateType::MinikubeCA, "minikubeCA", &self.certs.ca),
            (CertificateType::ProxyClientCA, "proxyClientCA", &self.certs.proxy),
        ]
    }
}

/// Makes sure both CA pairs exist and are valid, generating what is missing
/// or expired while holding the store lock.
pub fn generate_shared_ca_certs(
    store: &CaStore,
    generator: &dyn CertificateGenerator,
    logger: &mut dyn Logger,
) -> Result<CaState, CertError> {
    logger.log(&format!(
        "acquiring lock for shared ca certs: {} (timeout {:?})",
        store.lock_path().display(),
        store.lock_timeout
    ));
    with_lock(&store.lock_path, store.lock_timeout, || {
        ensure_cas(store, generator, logger)
    })
    .map_err(|e| match e {
        CertError::LockTimeout { .. } | CertError::LockAcquisition { .. } => {
            e.wrap("unable to acquire lock for shared ca certs")
        }
        other => other,
    })
}

fn ensure_cas(
    store: &CaStore,
    generator: &dyn CertificateGenerator,
    logger: &mut dyn Logger,
) -> Result<CaState, CertError> {
    let mut regenerated = false;
    for (cert_type, subject, pair) in store.specs() {
        let renewal = ensure_valid_or_regenerate(pair, false, logger, |logger| {
            logger.log(&format!("generating {} CA: {}", subject, pair.key.display()));
            generator.generate_ca_cert(pair, subject)
        })
        .context(format!("generate {:?} ca cert", cert_type))?;

        if renewal.regenerated() {
            regenerated = true;
        } else {
            logger.log(&format!("skipping {} CA generation: {}", subject, pair.key.display()));
        }
    }

    Ok(CaState {
        certs: store.certs().clone(),
        regenerated,
    })
}
