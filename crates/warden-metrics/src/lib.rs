//! Metrics collection and Prometheus exporter for warden.
//!
//! Instruments the authentication endpoint, registry lifecycle, and usage
//! accounting: decision counts, registry size, reload and flush outcomes.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Initialize the Prometheus metrics exporter.
///
/// Starts an HTTP server on the given address to expose metrics.
/// Returns an error message if binding fails.
pub fn init_metrics_server(listen: &str) -> Result<(), String> {
    let addr: SocketAddr = listen
        .parse()
        .map_err(|e| format!("invalid metrics listen address: {e}"))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("failed to install prometheus exporter: {e}"))?;

    Ok(())
}

// ============================================================================
// Metric Names
// ============================================================================

/// Total number of accepted authentication requests.
pub const AUTH_SUCCESS_TOTAL: &str = "warden_auth_success_total";
/// Total number of rejected authentication requests, by reason.
pub const AUTH_REJECT_TOTAL: &str = "warden_auth_reject_total";
/// Total number of malformed authentication requests.
pub const AUTH_BAD_REQUEST_TOTAL: &str = "warden_auth_bad_request_total";
/// Number of accounts currently in the registry.
pub const REGISTRY_USERS: &str = "warden_registry_users";
/// Total number of registry reloads, by result.
pub const REGISTRY_RELOADS_TOTAL: &str = "warden_registry_reloads_total";
/// Total number of registry loads that found a corrupt file.
pub const REGISTRY_LOAD_CORRUPT_TOTAL: &str = "warden_registry_load_corrupt_total";
/// Total number of usage updates applied.
pub const USAGE_UPDATES_TOTAL: &str = "warden_usage_updates_total";
/// Total number of usage reports naming an unknown user.
pub const USAGE_UNKNOWN_USER_TOTAL: &str = "warden_usage_unknown_user_total";
/// Total number of failed registry flushes (in-memory state ahead of disk).
pub const FLUSH_FAILURES_TOTAL: &str = "warden_registry_flush_failures_total";

// ============================================================================
// Metric Recording Functions
// ============================================================================

/// Record an accepted authentication request.
#[inline]
pub fn record_auth_success() {
    counter!(AUTH_SUCCESS_TOTAL).increment(1);
}

/// Record a rejected authentication request with its reason label
/// (`user_not_found`, `blocked`, `invalid_password`, `expired`,
/// `quota_exceeded`).
#[inline]
pub fn record_auth_reject(reason: &'static str) {
    counter!(AUTH_REJECT_TOTAL, "reason" => reason).increment(1);
}

/// Record a malformed authentication request.
#[inline]
pub fn record_auth_bad_request() {
    counter!(AUTH_BAD_REQUEST_TOTAL).increment(1);
}

/// Set the registry size gauge.
#[inline]
pub fn set_registry_users(count: usize) {
    gauge!(REGISTRY_USERS).set(count as f64);
}

/// Record a registry reload (result: "ok", "corrupt_fallback", "error").
#[inline]
pub fn record_registry_reload(result: &'static str) {
    counter!(REGISTRY_RELOADS_TOTAL, "result" => result).increment(1);
}

/// Record a load that found a corrupt registry file. Distinguishes "empty
/// because corrupt" from "empty because no users" for operators.
#[inline]
pub fn record_registry_load_corrupt() {
    counter!(REGISTRY_LOAD_CORRUPT_TOTAL).increment(1);
}

/// Record an applied usage update.
#[inline]
pub fn record_usage_update() {
    counter!(USAGE_UPDATES_TOTAL).increment(1);
}

/// Record a usage report for an unknown user.
#[inline]
pub fn record_usage_unknown_user() {
    counter!(USAGE_UNKNOWN_USER_TOTAL).increment(1);
}

/// Record a failed registry flush.
#[inline]
pub fn record_flush_failure() {
    counter!(FLUSH_FAILURES_TOTAL).increment(1);
}
