//! # warden
//!
//! Authentication and accounting control plane for a proxy deployment.
//!
//! Warden decides whether a connecting user may establish a session and
//! tracks per-user consumption against quotas, backed by a single durable
//! registry file shared with administrative tooling.
//!
//! ## Crates
//!
//! - [`warden_auth`] - Account registry, eligibility evaluation, accounting
//! - [`warden_config`] - Configuration loading and validation
//! - [`warden_metrics`] - Prometheus-compatible metrics
//! - [`warden_server`] - The authentication endpoint server

pub use warden_auth as auth;
pub use warden_config as config;
pub use warden_metrics as metrics;
pub use warden_server as server;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use warden_auth::{Account, Decision, Registry, RegistryStore, evaluate};
    pub use warden_config::{Config, load_config, validate_config};
    pub use warden_server::{AppState, CancellationToken, ServerError, build_state, serve};
}
