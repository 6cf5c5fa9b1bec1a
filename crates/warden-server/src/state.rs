//! Shared server state.

use std::sync::Arc;

use parking_lot::RwLock;
use warden_auth::{LoadSource, Registry, RegistryStore, UsageRecorder};

/// State injected into every handler: the registry cache, its durable
/// store, the accounting recorder, and registry health. Owned here and
/// passed down, never ambient.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub store: RegistryStore,
    pub recorder: Arc<UsageRecorder>,
    pub health: Arc<HealthState>,
}

/// Tracks where the current in-memory registry came from, so "empty
/// because the file is corrupt" stays distinguishable from "empty because
/// there are no users".
#[derive(Debug)]
pub struct HealthState {
    last_load: RwLock<LoadSource>,
}

impl HealthState {
    pub fn new(source: LoadSource) -> Self {
        Self {
            last_load: RwLock::new(source),
        }
    }

    pub fn set_last_load(&self, source: LoadSource) {
        *self.last_load.write() = source;
    }

    pub fn last_load(&self) -> LoadSource {
        *self.last_load.read()
    }

    /// Degraded means the registry contents do not reflect durable state:
    /// every authentication rejects as not-found until a good reload.
    pub fn is_degraded(&self) -> bool {
        self.last_load() == LoadSource::CorruptFile
    }

    /// Wire label for health responses.
    pub fn source_label(&self) -> &'static str {
        match self.last_load() {
            LoadSource::File => "file",
            LoadSource::MissingFile => "missing_file",
            LoadSource::CorruptFile => "corrupt_file",
        }
    }
}
