// src/cert/openssl.rs
use chrono::{Duration, Utc};
use openssl::{
    asn1::{Asn1Integer, Asn1Time},
    bn::{BigNum, MsbOption},
    error::ErrorStack,
    hash::MessageDigest,
    nid::Nid,
    pkey::{PKey, Private},
    rsa::Rsa,
    x509::{
        extension::{
            BasicConstraints, ExtendedKeyUsage, KeyUsage, SubjectAlternativeName,
            SubjectKeyIdentifier,
        },
        X509Builder, X509Name, X509NameBuilder, X509,
    },
};
use std::{fs, io, path::Path};

use super::types::{CredentialPair, SanSet};
use crate::error::{BoxError, CertError};

/// Everything needed to issue one signed certificate.
#[derive(Debug, Clone)]
pub struct SignedCertRequest<'a> {
    pub pair: &'a CredentialPair,
    pub subject: &'a str,
    pub sans: &'a SanSet,
    pub ca: &'a CredentialPair,
    pub expiration: Duration,
}

/// Cryptographic generation of CA and signed certificate pairs.
pub trait CertificateGenerator {
    /// Writes a self-signed CA certificate and key to `pair`.
    fn generate_ca_cert(&self, pair: &CredentialPair, subject: &str) -> Result<(), CertError>;

    /// Writes a certificate signed by `request.ca` to `request.pair`.
    fn generate_signed_cert(&self, request: &SignedCertRequest<'_>) -> Result<(), CertError>;
}

#[derive(Debug, Clone)]
pub struct OpenSslGenerator {
    key_size: u32,
    ca_validity: Duration,
}

impl Default for OpenSslGenerator {
    fn default() -> Self {
        Self {
            key_size: 2048,
            ca_validity: Duration::days(365 * 10),
        }
    }
}

impl OpenSslGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ca_validity(mut self, ca_validity: Duration) -> Self {
        self.ca_validity = ca_validity;
        self
    }

    fn write_ca(&self, pair: &CredentialPair, subject: &str) -> Result<(), BoxError> {
        let key = generate_private_key(self.key_size)?;
        let name = build_name(subject, None)?;

        let mut builder = X509Builder::new()?;
        builder.set_version(2)?;
        let serial = serial_number()?;
        builder.set_serial_number(&serial)?;
        builder.set_subject_name(&name)?;
        builder.set_issuer_name(&name)?;
        builder.set_pubkey(&key)?;
        set_validity(&mut builder, self.ca_validity)?;

        builder.append_extension(BasicConstraints::new().critical().ca().build()?)?;
        builder.append_extension(
            KeyUsage::new()
                .critical()
                .digital_signature()
                .key_encipherment()
                .key_cert_sign()
                .crl_sign()
                .build()?,
        )?;
        let ski = SubjectKeyIdentifier::new().build(&builder.x509v3_context(None, None))?;
        builder.append_extension(ski)?;

        builder.sign(&key, MessageDigest::sha256())?;
        write_pair(pair, &builder.build(), &key)
    }

    fn write_signed(&self, request: &SignedCertRequest<'_>) -> Result<(), BoxError> {
        let ca_cert = X509::from_pem(&read(&request.ca.cert)?)?;
        let ca_key = PKey::private_key_from_pem(&read(&request.ca.key)?)?;

        let key = generate_private_key(self.key_size)?;
        let name = build_name(request.subject, Some("system:masters"))?;

        let mut builder = X509Builder::new()?;
        builder.set_version(2)?;
        let serial = serial_number()?;
        builder.set_serial_number(&serial)?;
        builder.set_subject_name(&name)?;
        builder.set_issuer_name(ca_cert.subject_name())?;
        builder.set_pubkey(&key)?;
        set_validity(&mut builder, request.expiration)?;

        builder.append_extension(BasicConstraints::new().critical().build()?)?;
        builder.append_extension(
            KeyUsage::new()
                .critical()
                .digital_signature()
                .key_encipherment()
                .build()?,
        )?;
        builder.append_extension(ExtendedKeyUsage::new().server_auth().client_auth().build()?)?;

        if !request.sans.is_empty() {
            let mut san = SubjectAlternativeName::new();
            for ip in &request.sans.ips {
                san.ip(&ip.to_string());
            }
            for name in &request.sans.names {
                san.dns(name);
            }
            let san = san.build(&builder.x509v3_context(Some(&*ca_cert), None))?;
            builder.append_extension(san)?;
        }

        builder.sign(&ca_key, MessageDigest::sha256())?;
        write_pair(request.pair, &builder.build(), &key)
    }
}

impl CertificateGenerator for OpenSslGenerator {
    fn generate_ca_cert(&self, pair: &CredentialPair, subject: &str) -> Result<(), CertError> {
        self.write_ca(pair, subject).map_err(|source| CertError::Generation {
            kind: "ca cert",
            subject: subject.to_string(),
            source,
        })
    }

    fn generate_signed_cert(&self, request: &SignedCertRequest<'_>) -> Result<(), CertError> {
        self.write_signed(request).map_err(|source| CertError::Generation {
            kind: "signed cert",
            subject: request.subject.to_string(),
            source,
        })
    }
}

fn read(path: &Path) -> Result<Vec<u8>, BoxError> {
    fs::read(path).map_err(|e| format!("read {}: {}", path.display(), e).into())
}

fn generate_private_key(key_size: u32) -> Result<PKey<Private>, ErrorStack> {
    PKey::from_rsa(Rsa::generate(key_size)?)
}

fn build_name(common_name: &str, organization: Option<&str>) -> Result<X509Name, ErrorStack> {
    let mut name = X509NameBuilder::new()?;
    if let Some(org) = organization {
        name.append_entry_by_nid(Nid::ORGANIZATIONNAME, org)?;
    }
    name.append_entry_by_nid(Nid::COMMONNAME, common_name)?;
    Ok(name.build())
}

fn serial_number() -> Result<Asn1Integer, ErrorStack> {
    let mut serial = BigNum::new()?;
    serial.rand(128, MsbOption::MAYBE_ZERO, false)?;
    serial.to_asn1_integer()
}

// Backdated a day to tolerate clock skew between host and guest.
fn set_validity(builder: &mut X509Builder, lifetime: Duration) -> Result<(), BoxError> {
    let now = Utc::now();
    let not_before = Asn1Time::from_unix((now - Duration::days(1)).timestamp() as _)?;
    let not_after = Asn1Time::from_unix((now + lifetime).timestamp() as _)?;
    builder.set_not_before(&not_before)?;
    builder.set_not_after(&not_after)?;
    Ok(())
}

fn write_pair(pair: &CredentialPair, cert: &X509, key: &PKey<Private>) -> Result<(), BoxError> {
    for path in pair.paths() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(&pair.cert, cert.to_pem()?)?;
    fs::write(&pair.key, key.rsa()?.private_key_to_pem()?)?;
    set_key_permissions(&pair.key)?;
    Ok(())
}

fn set_key_permissions(path: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}
