// src/cert/profile.rs
use std::{fs, path::PathBuf};

use super::openssl::{CertificateGenerator, SignedCertRequest};
use super::san::{apiserver_sans, fingerprint};
use super::types::{
    CaState, CertificateType, CredentialPair, Issuer, LeafCertSpec, SanPolicy, SanSet,
};
use super::verification::ensure_valid_or_regenerate;
use crate::config::{ClusterConfig, LocalPaths, NodeConfig};
use crate::error::{CertError, ResultExt};
use crate::utils::logging::Logger;

/// The three leaf certificates of a profile, in generation order.
pub fn leaf_cert_specs(paths: &LocalPaths, cluster: &str) -> [LeafCertSpec; 3] {
    let profile = paths.profile(cluster);
    [
        LeafCertSpec {
            cert_type: CertificateType::Client,
            subject: "minikube-user",
            pair: CredentialPair::new(paths.client_cert(cluster), paths.client_key(cluster)),
            sans: SanPolicy::None,
            fingerprinted: false,
            issuer: Issuer::Primary,
            transfer: false,
            follows_ca: true,
        },
        LeafCertSpec {
            cert_type: CertificateType::APIServer,
            subject: "minikube",
            pair: CredentialPair::in_dir(&profile, "apiserver"),
            sans: SanPolicy::ApiServer,
            fingerprinted: true,
            issuer: Issuer::Primary,
            transfer: true,
            follows_ca: true,
        },
        LeafCertSpec {
            cert_type: CertificateType::ProxyClient,
            subject: "aggregator",
            pair: CredentialPair::in_dir(&profile, "proxy-client"),
            sans: SanPolicy::None,
            fingerprinted: false,
            issuer: Issuer::Proxy,
            transfer: true,
            follows_ca: true,
        },
    ]
}

/// Inputs describing which node of which cluster to provision.
#[derive(Debug, Clone, Copy)]
pub struct ProfileRequest<'a> {
    pub config: &'a ClusterConfig,
    pub node: &'a NodeConfig,
    pub paths: &'a LocalPaths,
    pub daemon_host: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileCerts {
    /// Canonical cert/key paths to copy to the guest.
    pub transfer: Vec<PathBuf>,
    pub regenerated: Vec<CertificateType>,
    /// SAN fingerprint used for the API server cache files.
    pub fingerprint: Option<String>,
}

/// Reuses or regenerates the profile's leaf certificates. Worker nodes have
/// no API server and get nothing.
pub fn generate_profile_certs(
    request: &ProfileRequest<'_>,
    ca: &CaState,
    generator: &dyn CertificateGenerator,
    logger: &mut dyn Logger,
) -> Result<ProfileCerts, CertError> {
    if !request.node.control_plane {
        logger.debug_log(&format!(
            "{} is not a control plane node, skipping profile certs",
            request.node.name
        ));
        return Ok(ProfileCerts::default());
    }

    let cluster = &request.config.cluster_name;
    let sans = apiserver_sans(request.config, request.node, request.daemon_host)
        .context("getting apiserver SANs")?;
    let hash = fingerprint(&sans);
    let no_sans = SanSet::default();

    let mut result = ProfileCerts {
        fingerprint: Some(hash.clone()),
        ..ProfileCerts::default()
    };

    for spec in leaf_cert_specs(request.paths, cluster) {
        if spec.transfer {
            result.transfer.push(spec.pair.cert.clone());
            result.transfer.push(spec.pair.key.clone());
        }

        let effective = if spec.fingerprinted {
            spec.pair.with_suffix(&hash)
        } else {
            spec.pair.clone()
        };
        let spec_sans = match spec.sans {
            SanPolicy::None => &no_sans,
            SanPolicy::ApiServer => &sans,
        };
        let force = spec.follows_ca && ca.regenerated;

        let renewal = ensure_valid_or_regenerate(&effective, force, logger, |logger| {
            logger.log(&format!(
                "generating {} signed cert: {}",
                spec.subject,
                effective.key.display()
            ));
            generator.generate_signed_cert(&SignedCertRequest {
                pair: &effective,
                subject: spec.subject,
                sans: spec_sans,
                ca: ca.certs.issuer(spec.issuer),
                expiration: request.config.cert_expiration(),
            })
        })?;

        if renewal.regenerated() {
            result.regenerated.push(spec.cert_type);
        } else {
            logger.log(&format!(
                "skipping {} signed cert generation: {}",
                spec.subject,
                effective.key.display()
            ));
        }

        if spec.fingerprinted && (renewal.regenerated() || !same_contents(&effective, &spec.pair)) {
            promote(&effective, &spec.pair, logger)?;
        }
    }

    Ok(result)
}

/// True when both files of `a` and `b` are readable and byte-identical.
fn same_contents(a: &CredentialPair, b: &CredentialPair) -> bool {
    a.paths().iter().zip(b.paths()).all(|(x, y)| match (fs::read(x), fs::read(y)) {
        (Ok(x), Ok(y)) => x == y,
        _ => false,
    })
}

/// Copies the fingerprinted cache files over the canonical names.
fn promote(
    cached: &CredentialPair,
    canonical: &CredentialPair,
    logger: &mut dyn Logger,
) -> Result<(), CertError> {
    for (src, dst) in [(&cached.cert, &canonical.cert), (&cached.key, &canonical.key)] {
        logger.log(&format!("copying {} -> {}", src.display(), dst.display()));
        fs::copy(src, dst).map_err(|e| CertError::Copy {
            src: src.clone(),
            dst: dst.display().to_string(),
            source: Box::new(e),
        })?;
    }
    Ok(())
}
