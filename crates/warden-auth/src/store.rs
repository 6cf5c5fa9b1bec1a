//! Durable registry store.
//!
//! The registry persists as one JSON object keyed by username. Atomic write
//! (tmp + rename) ensures a reader never sees a half-written file.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{error, info, warn};

use crate::account::Account;
use crate::error::StoreError;

/// What to do when the registry file exists but cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorruptPolicy {
    /// Serve an empty registry (every authentication rejects as not-found)
    /// and surface the condition via log, metric, and health state.
    #[default]
    Empty,
    /// Return the parse error to the caller instead of substituting.
    Fail,
}

/// Where a loaded registry came from; distinguishes "legitimately empty"
/// from "empty because the file was unreadable".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Parsed from the registry file.
    File,
    /// No file at the configured path.
    MissingFile,
    /// File present but corrupt; an empty registry was substituted.
    CorruptFile,
}

/// Result of a successful `load`.
#[derive(Debug)]
pub struct LoadOutcome {
    pub accounts: HashMap<String, Account>,
    pub source: LoadSource,
}

impl LoadOutcome {
    /// True when the outcome is a corrupt-file fallback, i.e. the registry
    /// contents do not reflect durable state.
    #[inline]
    pub fn is_degraded(&self) -> bool {
        self.source == LoadSource::CorruptFile
    }
}

/// File-backed registry store with bounded I/O.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: PathBuf,
    io_timeout: Duration,
    on_corrupt: CorruptPolicy,
}

impl RegistryStore {
    pub fn new(path: impl Into<PathBuf>, io_timeout: Duration, on_corrupt: CorruptPolicy) -> Self {
        Self {
            path: path.into(),
            io_timeout,
            on_corrupt,
        }
    }

    /// The registry file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full registry from disk.
    ///
    /// A missing file is an empty registry. A corrupt file follows the
    /// configured [`CorruptPolicy`]; under [`CorruptPolicy::Empty`] the
    /// substitution is flagged in the returned [`LoadOutcome`] so callers
    /// can expose it, never silently conflated with "no users".
    pub async fn load(&self) -> Result<LoadOutcome, StoreError> {
        let read = tokio::time::timeout(self.io_timeout, tokio::fs::read_to_string(&self.path))
            .await
            .map_err(|_| StoreError::Timeout(self.io_timeout))?;

        let data = match read {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "registry file missing, starting empty");
                return Ok(LoadOutcome {
                    accounts: HashMap::new(),
                    source: LoadSource::MissingFile,
                });
            }
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        match serde_json::from_str::<HashMap<String, Account>>(&data) {
            Ok(accounts) => Ok(LoadOutcome {
                accounts,
                source: LoadSource::File,
            }),
            Err(e) => match self.on_corrupt {
                CorruptPolicy::Empty => {
                    error!(
                        path = %self.path.display(),
                        error = %e,
                        "corrupt registry file, serving EMPTY registry (all users locked out)"
                    );
                    Ok(LoadOutcome {
                        accounts: HashMap::new(),
                        source: LoadSource::CorruptFile,
                    })
                }
                CorruptPolicy::Fail => Err(StoreError::Corrupt {
                    path: self.path.clone(),
                    source: e,
                }),
            },
        }
    }

    /// Write the full registry to disk atomically.
    ///
    /// The serialized form is staged next to the target and renamed over it,
    /// so a crash mid-write leaves the previous file intact. On failure the
    /// in-memory registry is ahead of durable state; callers surface that.
    pub async fn save(&self, accounts: &HashMap<String, Account>) -> Result<(), StoreError> {
        let data = serde_json::to_string_pretty(accounts).map_err(StoreError::Serialize)?;

        let tmp = self.tmp_path();
        let write = async {
            if let Some(parent) = self.path.parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StoreError::io(parent, e))?;
            }
            tokio::fs::write(&tmp, data.as_bytes())
                .await
                .map_err(|e| StoreError::io(&tmp, e))?;
            tokio::fs::rename(&tmp, &self.path)
                .await
                .map_err(|e| StoreError::io(&self.path, e))
        };

        tokio::time::timeout(self.io_timeout, write)
            .await
            .map_err(|_| StoreError::Timeout(self.io_timeout))?
    }

    fn tmp_path(&self) -> PathBuf {
        let mut os = self.path.as_os_str().to_owned();
        os.push(".tmp");
        PathBuf::from(os)
    }
}

/// Blocking variants for one-shot callers (the admin CLI).
impl RegistryStore {
    /// Synchronous `load`, without the I/O deadline.
    pub fn load_blocking(&self) -> Result<LoadOutcome, StoreError> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(LoadOutcome {
                    accounts: HashMap::new(),
                    source: LoadSource::MissingFile,
                });
            }
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };
        match serde_json::from_str(&data) {
            Ok(accounts) => Ok(LoadOutcome {
                accounts,
                source: LoadSource::File,
            }),
            Err(e) => match self.on_corrupt {
                CorruptPolicy::Empty => {
                    warn!(path = %self.path.display(), error = %e, "corrupt registry file");
                    Ok(LoadOutcome {
                        accounts: HashMap::new(),
                        source: LoadSource::CorruptFile,
                    })
                }
                CorruptPolicy::Fail => Err(StoreError::Corrupt {
                    path: self.path.clone(),
                    source: e,
                }),
            },
        }
    }

    /// Synchronous atomic `save`.
    pub fn save_blocking(&self, accounts: &HashMap<String, Account>) -> Result<(), StoreError> {
        let data = serde_json::to_string_pretty(accounts).map_err(StoreError::Serialize)?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        let tmp = self.tmp_path();
        std::fs::write(&tmp, data.as_bytes()).map_err(|e| StoreError::io(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| StoreError::io(&self.path, e))
    }
}
