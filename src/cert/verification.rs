// src/cert/verification.rs
use chrono::{DateTime, TimeZone, Utc};
use std::{fmt, fs, path::Path};
use x509_parser::pem::parse_x509_pem;

use super::types::{CredentialPair, Renewal};
use crate::command::CommandRunner;
use crate::error::CertError;
use crate::utils::logging::Logger;

/// Why certificate bytes are unusable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Staleness {
    Undecodable,
    Unparsable(String),
    Expired { not_after: DateTime<Utc> },
}

impl fmt::Display for Staleness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undecodable => write!(f, "no PEM block"),
            Self::Unparsable(e) => write!(f, "not an X.509 certificate: {}", e),
            Self::Expired { not_after } => write!(f, "expired at {}", not_after),
        }
    }
}

/// Decodes the first PEM block, parses it as X.509 and requires `NotAfter`
/// to be strictly after `now`. Returns `NotAfter` on success.
pub fn check_certificate(bytes: &[u8], now: DateTime<Utc>) -> Result<DateTime<Utc>, Staleness> {
    let (_, pem) = parse_x509_pem(bytes).map_err(|_| Staleness::Undecodable)?;
    let cert = pem
        .parse_x509()
        .map_err(|e| Staleness::Unparsable(e.to_string()))?;

    let timestamp = cert.validity().not_after.timestamp();
    let not_after = Utc
        .timestamp_opt(timestamp, 0)
        .single()
        .ok_or_else(|| Staleness::Unparsable(format!("NotAfter out of range: {}", timestamp)))?;

    if not_after <= now {
        return Err(Staleness::Expired { not_after });
    }
    Ok(not_after)
}

/// True if `path` exists and can be opened for reading.
pub fn can_read(path: &Path) -> bool {
    fs::File::open(path).is_ok()
}

fn remove_pair(pair: &CredentialPair) {
    for path in pair.paths() {
        let _ = fs::remove_file(path);
    }
}

/// Checks a cert/key pair. Anything unusable (unreadable key, unreadable or
/// corrupt cert, expired cert) deletes both files and returns false.
pub fn is_valid(pair: &CredentialPair, logger: &mut dyn Logger) -> bool {
    if !can_read(&pair.key) {
        logger.debug_log(&format!("cannot read key {}", pair.key.display()));
        remove_pair(pair);
        return false;
    }

    let bytes = match fs::read(&pair.cert) {
        Ok(bytes) => bytes,
        Err(e) => {
            logger.log(&format!("failed to read cert file {}: {}", pair.cert.display(), e));
            remove_pair(pair);
            return false;
        }
    };

    let now = Utc::now();
    match check_certificate(&bytes, now) {
        Ok(_) => true,
        Err(Staleness::Expired { not_after }) => {
            let name = pair
                .cert
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            logger.warn(&format!("Certificate {} has expired. Generating a new one...", name));
            logger.log(&format!(
                "cert expired {}: expiration: {}, now: {}",
                pair.cert.display(),
                not_after,
                now
            ));
            remove_pair(pair);
            false
        }
        Err(reason) => {
            logger.log(&format!("failed to check cert file {}: {}", pair.cert.display(), reason));
            remove_pair(pair);
            false
        }
    }
}

/// Remote variant of [`is_valid`] for certificates kubeadm manages on the
/// guest. Nothing is deleted. A failed read counts as valid: on first start
/// the file does not exist yet and there is nothing to refresh.
pub fn is_kubeadm_cert_valid(
    runner: &mut dyn CommandRunner,
    cert_path: &str,
    logger: &mut dyn Logger,
) -> bool {
    let rr = match runner.run_cmd(&["cat", cert_path]) {
        Ok(rr) => rr,
        Err(e) => {
            logger.log(&format!("failed to read cert file {}: {}", cert_path, e));
            return true;
        }
    };

    let now = Utc::now();
    match check_certificate(&rr.stdout, now) {
        Ok(_) => true,
        Err(reason) => {
            logger.log(&format!("kubeadm cert {} unusable: {}", cert_path, reason));
            false
        }
    }
}

/// Reuses `pair` when it is valid and `force` is unset; otherwise clears any
/// leftovers and runs `regenerate`.
pub fn ensure_valid_or_regenerate<F>(
    pair: &CredentialPair,
    force: bool,
    logger: &mut dyn Logger,
    regenerate: F,
) -> Result<Renewal, CertError>
where
    F: FnOnce(&mut dyn Logger) -> Result<(), CertError>,
{
    if !force && is_valid(pair, logger) {
        return Ok(Renewal::Reused);
    }

    for path in pair.paths() {
        if can_read(path) {
            fs::remove_file(path)
                .map_err(|e| CertError::io(format!("remove stale {}", path.display()), e))?;
        }
    }
    regenerate(logger)?;
    Ok(Renewal::Regenerated)
}
