//! Registry reload: flush, re-read, swap.
//!
//! Triggered three ways: SIGHUP, the loopback-only `POST /reload`, and an
//! optional periodic ticker (the registry file is shared with admin tooling
//! that edits it directly, so the server polls for changes by default).

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use warden_auth::{LoadSource, StoreError};

use crate::state::AppState;

/// What a completed reload swapped in.
#[derive(Debug, Clone, Copy)]
pub struct ReloadSummary {
    pub users: usize,
    pub source: LoadSource,
}

/// Re-read the registry file and atomically swap it into the cache.
///
/// Pending usage is flushed first so the swap never reverts accounted
/// bytes; if that flush fails the reload is abandoned and the in-memory
/// registry stays authoritative. Under the `fail` corrupt policy a corrupt
/// file also keeps the previous registry.
pub async fn reload(state: &AppState) -> Result<ReloadSummary, StoreError> {
    state.recorder.flush().await?;

    let outcome = match state.store.load().await {
        Ok(outcome) => outcome,
        Err(e) => {
            warden_metrics::record_registry_reload("error");
            return Err(e);
        }
    };

    if outcome.source == LoadSource::CorruptFile {
        warden_metrics::record_registry_load_corrupt();
        warden_metrics::record_registry_reload("corrupt_fallback");
    } else {
        warden_metrics::record_registry_reload("ok");
    }

    let users = outcome.accounts.len();
    state.registry.replace_all(outcome.accounts);
    state.health.set_last_load(outcome.source);
    warden_metrics::set_registry_users(users);

    Ok(ReloadSummary {
        users,
        source: outcome.source,
    })
}

/// Reload on a fixed interval until shutdown. No-op when `interval` is zero.
pub(crate) fn spawn_periodic(state: AppState, interval: Duration, shutdown: CancellationToken) {
    if interval.is_zero() {
        return;
    }
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The immediate first tick would reload what we just loaded.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => match reload(&state).await {
                    Ok(summary) => {
                        debug!(users = summary.users, "periodic registry reload");
                    }
                    Err(e) => warn!(error = %e, "periodic registry reload failed"),
                },
                _ = shutdown.cancelled() => break,
            }
        }
    });
}

/// Reload on SIGHUP (Unix only).
#[cfg(unix)]
pub(crate) fn spawn_sighup(state: AppState, shutdown: CancellationToken) {
    use tokio::signal::unix::{SignalKind, signal};

    tokio::spawn(async move {
        let mut sighup = match signal(SignalKind::hangup()) {
            Ok(sig) => sig,
            Err(e) => {
                warn!(error = %e, "failed to install SIGHUP handler, reload-on-signal disabled");
                return;
            }
        };

        loop {
            tokio::select! {
                received = sighup.recv() => {
                    if received.is_none() {
                        break;
                    }
                    info!("SIGHUP received, reloading registry");
                    match reload(&state).await {
                        Ok(summary) => info!(users = summary.users, "registry reloaded"),
                        Err(e) => warn!(error = %e, "registry reload failed"),
                    }
                }
                _ = shutdown.cancelled() => break,
            }
        }
    });
}
