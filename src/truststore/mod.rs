// src/truststore/mod.rs
mod collect;
mod install;

pub use collect::{collect_ca_certs, is_valid_pem_certificate, EXCLUDED_CERT_NAMES, MIN_CERT_SIZE};
pub use install::{install_cert_symlinks, subject_hash};

use std::path::PathBuf;

/// A local CA certificate and where it goes in the guest trust store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TrustStoreEntry {
    pub source: PathBuf,
    pub target: String,
}

impl TrustStoreEntry {
    pub fn target_dir(&self) -> &str {
        self.target.rsplit_once('/').map_or("", |(dir, _)| dir)
    }

    pub fn target_name(&self) -> &str {
        self.target.rsplit_once('/').map_or(self.target.as_str(), |(_, name)| name)
    }
}
