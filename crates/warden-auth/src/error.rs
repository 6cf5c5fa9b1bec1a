//! Registry store error types.

use std::path::PathBuf;

/// Error from loading or saving the registry file.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem I/O failed.
    #[error("io on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Registry file exists but is not a valid registry document.
    #[error("corrupt registry file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Serializing the in-memory registry failed.
    #[error("serialize registry: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Store I/O exceeded the configured deadline.
    #[error("registry io timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
