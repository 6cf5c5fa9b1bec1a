//! Configuration type definitions for server, registry, metrics, and logging.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::defaults::*;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the authentication endpoint listens on.
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Registry file path.
    #[serde(default = "default_registry_path")]
    pub path: String,

    /// Seconds between automatic reloads from the file (0 = disabled;
    /// SIGHUP and `POST /reload` always work).
    #[serde(default = "default_reload_interval_secs")]
    pub reload_interval_secs: u64,

    /// Seconds between usage flushes to the file. This is the durability
    /// window: a crash can lose at most this much accounted usage.
    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,

    /// Pending usage updates that force an early flush.
    #[serde(default = "default_flush_max_pending")]
    pub flush_max_pending: usize,

    /// Deadline for any single store read or write.
    #[serde(default = "default_io_timeout_secs")]
    pub io_timeout_secs: u64,

    /// What to do when the registry file is unreadable: "empty" serves an
    /// empty registry (loudly), "fail" refuses.
    #[serde(default = "default_on_corrupt")]
    pub on_corrupt: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: default_registry_path(),
            reload_interval_secs: default_reload_interval_secs(),
            flush_interval_secs: default_flush_interval_secs(),
            flush_max_pending: default_flush_max_pending(),
            io_timeout_secs: default_io_timeout_secs(),
            on_corrupt: default_on_corrupt(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Prometheus exporter listen address (None = disabled).
    #[serde(default)]
    pub listen: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base log level (trace, debug, info, warn, error).
    #[serde(default)]
    pub level: Option<String>,
    /// Output format (json, pretty, compact).
    #[serde(default)]
    pub format: Option<String>,
    /// Output target (stdout, stderr).
    #[serde(default)]
    pub output: Option<String>,
    /// Per-module log level overrides.
    #[serde(default)]
    pub filters: HashMap<String, String>,
}
