// src/cert/lock.rs
use fs2::FileExt;
use std::{
    fs::{self, File, OpenOptions},
    io,
    path::Path,
    thread,
    time::{Duration, Instant},
};

use crate::error::CertError;

pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(60);
const RETRY_DELAY: Duration = Duration::from_millis(100);

/// Advisory lock on a filesystem path, shared by every process that opens the
/// same path. Released on drop.
#[derive(Debug)]
pub struct PathLock {
    file: File,
}

impl PathLock {
    /// Polls for the lock until `timeout` has passed.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self, CertError> {
        let acquisition = |source| CertError::LockAcquisition {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(acquisition)?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(acquisition)?;

        let deadline = Instant::now() + timeout;
        loop {
            match FileExt::try_lock_exclusive(&file) {
                Ok(()) => {
                    return Ok(Self { file })
                }
                Err(e) if is_contended(&e) => {
                    if Instant::now() >= deadline {
                        return Err(CertError::LockTimeout {
                            path: path.to_path_buf(),
                            timeout,
                        });
                    }
                    thread::sleep(RETRY_DELAY.min(deadline.saturating_duration_since(Instant::now())));
                }
                Err(e) => return Err(acquisition(e)),
            }
        }
    }

}

impl Drop for PathLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn is_contended(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::WouldBlock
        || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

/// Runs `f` while holding the lock at `path`. `f` never runs if the lock is
/// not acquired; the lock is released whether `f` succeeds or fails.
pub fn with_lock<T, F>(path: &Path, timeout: Duration, f: F) -> Result<T, CertError>
where
    F: FnOnce() -> Result<T, CertError>,
{
    let _guard = PathLock::acquire(path, timeout)?;
    f()
}
