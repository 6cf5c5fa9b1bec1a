//! Configuration for the warden control plane.
//!
//! Config files may be JSON (with comments), YAML, or TOML; the format is
//! chosen by file extension. CLI flags override file values.

mod cli;
mod defaults;
mod loader;
mod types;
mod validate;

pub use cli::{CliOverrides, apply_overrides};
pub use loader::{ConfigError, load_config};
pub use types::{Config, LoggingConfig, MetricsConfig, RegistryConfig, ServerConfig};
pub use validate::validate_config;
