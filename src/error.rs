// src/error.rs
use std::{io, path::PathBuf, time::Duration};

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum CertError {
    #[error("lock acquisition failed for {}: timed out after {timeout:?}", path.display())]
    LockTimeout { path: PathBuf, timeout: Duration },

    #[error("lock acquisition failed for {}: {source}", path.display())]
    LockAcquisition {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("generate {kind} for {subject:?}: {source}")]
    Generation {
        kind: &'static str,
        subject: String,
        #[source]
        source: BoxError,
    },

    #[error("copy {} -> {dst}: {source}", src.display())]
    Copy {
        src: PathBuf,
        dst: String,
        #[source]
        source: BoxError,
    },

    #[error("traversal certificates dir {}: {source}", dir.display())]
    Traversal {
        dir: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("`{command}` failed (exit code {}): stdout: {stdout:?} stderr: {stderr:?}", exit_code.map_or_else(|| "none".to_string(), |c| c.to_string()))]
    RemoteCommand {
        command: String,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<CertError>,
    },
}

impl CertError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Wraps the error with the name of the operation that failed.
    pub fn wrap(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Looks through `Context` wrappers for the error that started it.
    pub fn root(&self) -> &CertError {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<serde_json::Error> for CertError {
    fn from(error: serde_json::Error) -> Self {
        CertError::Serialization(error.to_string())
    }
}

impl From<serde_yaml::Error> for CertError {
    fn from(error: serde_yaml::Error) -> Self {
        CertError::Serialization(error.to_string())
    }
}

pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T, CertError>;
}

impl<T> ResultExt<T> for Result<T, CertError> {
    fn context(self, context: impl Into<String>) -> Result<T, CertError> {
        self.map_err(|e| e.wrap(context))
    }
}
