//! CLI override definitions and application logic.

use clap::Parser;

use crate::Config;

#[derive(Debug, Clone, Parser, Default)]
pub struct CliOverrides {
    /// Override auth endpoint listen address, e.g. 127.0.0.1:28262
    #[arg(long)]
    pub listen: Option<String>,
    /// Override registry file path
    #[arg(long)]
    pub registry: Option<String>,
    /// Override automatic reload interval in seconds (0 = disabled)
    #[arg(long)]
    pub reload_interval_secs: Option<u64>,
    /// Override usage flush interval in seconds
    #[arg(long)]
    pub flush_interval_secs: Option<u64>,
    /// Override corrupt-registry policy (empty | fail)
    #[arg(long)]
    pub on_corrupt: Option<String>,
    /// Override metrics listen address
    #[arg(long)]
    pub metrics_listen: Option<String>,
    /// Override log level (trace/debug/info/warn/error)
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn apply_overrides(config: &mut Config, overrides: &CliOverrides) {
    if let Some(v) = &overrides.listen {
        config.server.listen = v.clone();
    }
    if let Some(v) = &overrides.registry {
        config.registry.path = v.clone();
    }
    if let Some(v) = overrides.reload_interval_secs {
        config.registry.reload_interval_secs = v;
    }
    if let Some(v) = overrides.flush_interval_secs {
        config.registry.flush_interval_secs = v;
    }
    if let Some(v) = &overrides.on_corrupt {
        config.registry.on_corrupt = v.clone();
    }
    if let Some(v) = &overrides.metrics_listen {
        config.metrics.listen = Some(v.clone());
    }
    if let Some(v) = &overrides.log_level {
        config.logging.level = Some(v.clone());
    }
}
