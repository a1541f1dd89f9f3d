// cert/types.rs
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::{Path, PathBuf};

/// A certificate and its private key on the local filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialPair {
    pub cert: PathBuf,
    pub key: PathBuf,
}

impl CredentialPair {
    pub fn new(cert: impl Into<PathBuf>, key: impl Into<PathBuf>) -> Self {
        Self {
            cert: cert.into(),
            key: key.into(),
        }
    }

    /// Pair in `dir` named `<stem>.crt` / `<stem>.key`.
    pub fn in_dir(dir: &Path, stem: &str) -> Self {
        Self::new(dir.join(format!("{}.crt", stem)), dir.join(format!("{}.key", stem)))
    }

    /// Same pair with `.<suffix>` appended to both file names.
    pub fn with_suffix(&self, suffix: &str) -> Self {
        let append = |p: &Path| {
            let mut os = p.as_os_str().to_os_string();
            os.push(".");
            os.push(suffix);
            PathBuf::from(os)
        };
        Self::new(append(&self.cert), append(&self.key))
    }

    pub fn paths(&self) -> [&Path; 2] {
        [&self.cert, &self.key]
    }
}

/// What an "ensure valid or regenerate" step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Renewal {
    Reused,
    Regenerated,
}

impl Renewal {
    pub fn regenerated(self) -> bool {
        self == Renewal::Regenerated
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CertificateType {
    /// Signs the client and API server certificates.
    MinikubeCA,
    /// Signs the aggregator front-proxy client certificate.
    ProxyClientCA,
    Client,
    APIServer,
    ProxyClient,
}

/// Which CA pair signs a leaf certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Issuer {
    Primary,
    Proxy,
}

/// How a leaf certificate picks its Subject Alternative Names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanPolicy {
    None,
    ApiServer,
}

/// IPs and DNS names a certificate is valid for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanSet {
    pub ips: Vec<IpAddr>,
    pub names: Vec<String>,
}

impl SanSet {
    pub fn is_empty(&self) -> bool {
        self.ips.is_empty() && self.names.is_empty()
    }
}

/// One row of the leaf certificate table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafCertSpec {
    pub cert_type: CertificateType,
    pub subject: &'static str,
    /// Canonical pair consumers reference.
    pub pair: CredentialPair,
    pub sans: SanPolicy,
    /// Cache under a SAN-fingerprinted file name, then promote to `pair`.
    pub fingerprinted: bool,
    pub issuer: Issuer,
    /// Copied to the guest. The user client cert stays on the host.
    pub transfer: bool,
    /// Regenerate whenever any CA was regenerated in this run.
    pub follows_ca: bool,
}

/// The two shared CA pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaCerts {
    pub ca: CredentialPair,
    pub proxy: CredentialPair,
}

impl CaCerts {
    pub fn issuer(&self, issuer: Issuer) -> &CredentialPair {
        match issuer {
            Issuer::Primary => &self.ca,
            Issuer::Proxy => &self.proxy,
        }
    }
}

/// CA pairs plus whether either was (re)created in this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaState {
    pub certs: CaCerts,
    pub regenerated: bool,
}
