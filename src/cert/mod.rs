// src/cert/mod.rs
pub mod ca;
pub mod kubeadm;
pub mod lock;
pub mod openssl;
pub mod operations;
pub mod profile;
pub mod san;
pub mod types;
pub mod verification;

pub use ca::{generate_shared_ca_certs, CaStore};
pub use kubeadm::refresh_kubeadm_certs;
pub use lock::{with_lock, PathLock};
pub use openssl::{CertificateGenerator, OpenSslGenerator, SignedCertRequest};
pub use operations::{CertificateOperations, SetupReport};
pub use profile::{generate_profile_certs, ProfileCerts, ProfileRequest};
pub use types::{CaCerts, CaState, CertificateType, CredentialPair, Renewal, SanSet};
pub use verification::{is_kubeadm_cert_valid, is_valid};

#[cfg(test)]
use crate::error::CertError;

#[cfg(test)]
mod counting;
