// src/command/assets.rs
use std::{
    fs::File,
    io::{self, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
};

/// A file that can be placed on the execution target.
pub trait CopyableFile {
    /// Local origin, used in log and error messages.
    fn source_path(&self) -> &Path;
    fn target_dir(&self) -> &str;
    fn target_name(&self) -> &str;
    /// Octal mode string such as `0644`.
    fn permissions(&self) -> &str;
    fn len(&self) -> u64;
    fn contents(&mut self) -> io::Result<Vec<u8>>;
    /// Releases any held handle. Safe to call more than once.
    fn close(&mut self) -> io::Result<()>;

    fn target_path(&self) -> String {
        format!("{}/{}", self.target_dir().trim_end_matches('/'), self.target_name())
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A local file kept open from creation until `close`.
#[derive(Debug)]
pub struct FileAsset {
    source: PathBuf,
    target_dir: String,
    target_name: String,
    permissions: String,
    length: u64,
    file: Option<File>,
}

impl FileAsset {
    pub fn new(
        source: impl Into<PathBuf>,
        target_dir: &str,
        target_name: &str,
        permissions: &str,
    ) -> io::Result<Self> {
        let source = source.into();
        let file = File::open(&source)?;
        let length = file.metadata()?.len();
        Ok(Self {
            source,
            target_dir: target_dir.to_string(),
            target_name: target_name.to_string(),
            permissions: permissions.to_string(),
            length,
            file: Some(file),
        })
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }
}

impl CopyableFile for FileAsset {
    fn source_path(&self) -> &Path {
        &self.source
    }

    fn target_dir(&self) -> &str {
        &self.target_dir
    }

    fn target_name(&self) -> &str {
        &self.target_name
    }

    fn permissions(&self) -> &str {
        &self.permissions
    }

    fn len(&self) -> u64 {
        self.length
    }

    fn contents(&mut self) -> io::Result<Vec<u8>> {
        let file = self.file.as_mut().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::Other,
                format!("asset {} already closed", self.source.display()),
            )
        })?;
        file.seek(SeekFrom::Start(0))?;
        let mut buf = Vec::with_capacity(self.length as usize);
        file.read_to_end(&mut buf)?;
        Ok(buf)
    }

    fn close(&mut self) -> io::Result<()> {
        if let Some(file) = self.file.take() {
            drop(file);
        }
        Ok(())
    }
}

/// Generated content with no local file behind it.
#[derive(Debug, Clone)]
pub struct MemoryAsset {
    data: Vec<u8>,
    target_dir: String,
    target_name: String,
    permissions: String,
}

impl MemoryAsset {
    pub fn new(data: Vec<u8>, target_dir: &str, target_name: &str, permissions: &str) -> Self {
        Self {
            data,
            target_dir: target_dir.to_string(),
            target_name: target_name.to_string(),
            permissions: permissions.to_string(),
        }
    }
}

impl CopyableFile for MemoryAsset {
    fn source_path(&self) -> &Path {
        Path::new("memory")
    }

    fn target_dir(&self) -> &str {
        &self.target_dir
    }

    fn target_name(&self) -> &str {
        &self.target_name
    }

    fn permissions(&self) -> &str {
        &self.permissions
    }

    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    fn contents(&mut self) -> io::Result<Vec<u8>> {
        Ok(self.data.clone())
    }

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}
