// src/command/manifest.rs
use std::{io, path::Path};

use super::{CommandRunner, CopyableFile, FileAsset};
use crate::error::CertError;
use crate::utils::logging::Logger;

/// Assets bound for the guest, held open from the moment they are added.
/// Callers release them with `close_all` on every path, error or not.
#[derive(Default)]
pub struct TransferManifest {
    assets: Vec<Box<dyn CopyableFile>>,
}

impl TransferManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, asset: Box<dyn CopyableFile>) {
        self.assets.push(asset);
    }

    /// Opens `source` and adds it. Nothing is added if the open fails.
    pub fn push_file(
        &mut self,
        source: &Path,
        target_dir: &str,
        target_name: &str,
        permissions: &str,
    ) -> io::Result<()> {
        let asset = FileAsset::new(source, target_dir, target_name, permissions)?;
        self.assets.push(Box::new(asset));
        Ok(())
    }

    /// Copies every asset in order and returns their guest paths. Stops at
    /// the first failure, naming its source and destination.
    pub fn copy_all(
        &mut self,
        runner: &mut dyn CommandRunner,
        logger: &mut dyn Logger,
    ) -> Result<Vec<String>, CertError> {
        let mut copied = Vec::with_capacity(self.assets.len());
        for asset in self.assets.iter_mut() {
            let target = asset.target_path();
            logger.debug_log(&format!("copying {} -> {}", asset.source_path().display(), target));
            if let Err(e) = runner.copy(asset.as_mut()) {
                return Err(CertError::Copy {
                    src: asset.source_path().to_path_buf(),
                    dst: target,
                    source: Box::new(e),
                });
            }
            copied.push(target);
        }
        Ok(copied)
    }

    /// Closes every asset; close errors are logged, never returned.
    pub fn close_all(&mut self, logger: &mut dyn Logger) {
        for asset in self.assets.iter_mut() {
            if let Err(e) = asset.close() {
                logger.warn(&format!(
                    "error closing the file {}: {}",
                    asset.source_path().display(),
                    e
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::RunResult;
    use crate::utils::logging::MemoryLogger;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct TrackedAsset {
        source: PathBuf,
        name: String,
        open: bool,
        closes: Arc<AtomicUsize>,
        fail_close: bool,
    }

    impl TrackedAsset {
        fn boxed(name: &str, closes: &Arc<AtomicUsize>) -> Box<dyn CopyableFile> {
            Box::new(Self {
                source: PathBuf::from(format!("/host/{}", name)),
                name: name.to_string(),
                open: true,
                closes: Arc::clone(closes),
                fail_close: false,
            })
        }
    }

    impl CopyableFile for TrackedAsset {
        fn source_path(&self) -> &Path {
            &self.source
        }

        fn target_dir(&self) -> &str {
            "/var/lib/minikube/certs"
        }

        fn target_name(&self) -> &str {
            &self.name
        }

        fn permissions(&self) -> &str {
            "0644"
        }

        fn len(&self) -> u64 {
            0
        }

        fn contents(&mut self) -> io::Result<Vec<u8>> {
            Ok(Vec::new())
        }

        fn close(&mut self) -> io::Result<()> {
            if self.open {
                self.open = false;
                self.closes.fetch_add(1, Ordering::SeqCst);
            }
            if self.fail_close {
                return Err(io::Error::new(io::ErrorKind::Other, "handle busy"));
            }
            Ok(())
        }
    }

    /// Accepts copies until it reaches `fail_on`.
    struct FlakyRunner {
        fail_on: &'static str,
        copied: Vec<String>,
    }

    impl CommandRunner for FlakyRunner {
        fn run_cmd(&mut self, argv: &[&str]) -> Result<RunResult, CertError> {
            Ok(RunResult {
                args: argv.iter().map(|a| a.to_string()).collect(),
                exit_code: Some(0),
                ..RunResult::default()
            })
        }

        fn copy(&mut self, asset: &mut dyn CopyableFile) -> Result<(), CertError> {
            if asset.target_name() == self.fail_on {
                return Err(CertError::config("connection reset"));
            }
            self.copied.push(asset.target_path());
            Ok(())
        }
    }

    #[test]
    fn failed_copy_still_closes_every_asset() {
        let closes = Arc::new(AtomicUsize::new(0));
        let mut manifest = TransferManifest::new();
        for name in ["apiserver.crt", "ca.crt", "ca.key"] {
            manifest.push(TrackedAsset::boxed(name, &closes));
        }
        let mut runner = FlakyRunner {
            fail_on: "ca.crt",
            copied: Vec::new(),
        };
        let mut logger = MemoryLogger::new();

        let err = manifest.copy_all(&mut runner, &mut logger).unwrap_err();
        manifest.close_all(&mut logger);

        match err {
            CertError::Copy { src, dst, .. } => {
                assert_eq!(src, PathBuf::from("/host/ca.crt"));
                assert_eq!(dst, "/var/lib/minikube/certs/ca.crt");
            }
            other => panic!("unexpected: {other}"),
        }
        assert_eq!(runner.copied, vec!["/var/lib/minikube/certs/apiserver.crt"]);
        assert_eq!(closes.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn assets_opened_before_a_failed_open_are_closed() {
        let closes = Arc::new(AtomicUsize::new(0));
        let mut manifest = TransferManifest::new();
        manifest.push(TrackedAsset::boxed("apiserver.crt", &closes));
        manifest.push(TrackedAsset::boxed("apiserver.key", &closes));

        let missing = manifest.push_file(
            Path::new("/nonexistent/proxy-client.crt"),
            "/var/lib/minikube/certs",
            "proxy-client.crt",
            "0644",
        );
        assert!(missing.is_err());

        manifest.close_all(&mut MemoryLogger::new());
        assert_eq!(closes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn close_errors_are_logged_and_the_rest_still_closed() {
        let closes = Arc::new(AtomicUsize::new(0));
        let mut manifest = TransferManifest::new();
        manifest.push(Box::new(TrackedAsset {
            source: PathBuf::from("/host/ca.crt"),
            name: "ca.crt".to_string(),
            open: true,
            closes: Arc::clone(&closes),
            fail_close: true,
        }));
        manifest.push(TrackedAsset::boxed("ca.key", &closes));

        let mut logger = MemoryLogger::new();
        manifest.close_all(&mut logger);
        assert_eq!(closes.load(Ordering::SeqCst), 2);
        assert!(logger.contains("error closing the file /host/ca.crt: handle busy"));
    }
}
