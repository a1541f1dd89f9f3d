// src/truststore/install.rs
use super::TrustStoreEntry;
use crate::command::{run_sudo_bash, shell_quote, CommandRunner};
use crate::config::paths::GUEST_CERT_STORE_DIR;
use crate::error::CertError;
use crate::utils::logging::Logger;

/// OpenSSL subject hash of a certificate on the guest.
pub fn subject_hash(
    runner: &mut dyn CommandRunner,
    cert_path: &str,
    logger: &mut dyn Logger,
) -> Result<String, CertError> {
    let listing = runner.run_cmd(&["ls", "-la", cert_path])?;
    logger.log(&format!("hashing: {}", listing.stdout_str().trim_end()));

    let rr = match runner.run_cmd(&["openssl", "x509", "-hash", "-noout", "-in", cert_path]) {
        Ok(rr) => rr,
        Err(e) => {
            let contents = runner
                .run_cmd(&["cat", cert_path])
                .map(|rr| rr.stdout_str())
                .unwrap_or_default();
            return Err(e.wrap(format!("cert:\n{}\n---\n{}", listing.output(), contents)));
        }
    };

    let hash = rr.stdout_str().trim().to_string();
    if hash.is_empty() || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CertError::RemoteCommand {
            command: rr.command(),
            exit_code: rr.exit_code,
            stdout: rr.stdout_str(),
            stderr: format!("unexpected subject hash {:?}", hash),
        });
    }
    Ok(hash)
}

/// Links every copied CA certificate into the guest certificate store, plus a
/// `<subject hash>.0` link when openssl is available on the guest.
pub fn install_cert_symlinks(
    runner: &mut dyn CommandRunner,
    entries: &[TrustStoreEntry],
    logger: &mut dyn Logger,
) -> Result<(), CertError> {
    let has_ssl_binary = runner.run_cmd(&["openssl", "version"]).is_ok();
    if !has_ssl_binary && !entries.is_empty() {
        logger.warn("OpenSSL not found. Please recreate the cluster with the latest minikube ISO.");
    }

    for entry in entries {
        let ca_cert_file = entry.target.as_str();
        let cert_store_path = format!("{}/{}", GUEST_CERT_STORE_DIR, entry.target_name());

        let link = format!(
            "test -s {src} && ln -fs {src} {dst}",
            src = shell_quote(ca_cert_file),
            dst = shell_quote(&cert_store_path)
        );
        run_sudo_bash(runner, &link)
            .map_err(|e| e.wrap(format!("create symlink for {}", ca_cert_file)))?;

        if !has_ssl_binary {
            continue;
        }

        let hash = subject_hash(runner, ca_cert_file, logger)
            .map_err(|e| e.wrap(format!("calculate hash for cacert {}", ca_cert_file)))?;
        let hash_link = format!("{}/{}.0", GUEST_CERT_STORE_DIR, hash);

        // an existing hash link is kept even when it dangles
        let link = format!(
            "test -L {hash_link} || ln -fs {dst} {hash_link}",
            hash_link = shell_quote(&hash_link),
            dst = shell_quote(&cert_store_path)
        );
        run_sudo_bash(runner, &link)
            .map_err(|e| e.wrap(format!("create symlink for {}", ca_cert_file)))?;
    }
    Ok(())
}
