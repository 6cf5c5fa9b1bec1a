//! Usage accounting write path.
//!
//! Counter updates land in the in-memory registry immediately; persistence
//! is debounced behind a background flusher (interval ticker plus a
//! max-pending threshold). The durability window is therefore one flush
//! interval — or `max_pending` updates, whichever comes first — of accounted
//! usage that a crash can lose.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::registry::Registry;
use crate::store::RegistryStore;

/// Flush tuning for the [`UsageRecorder`].
#[derive(Debug, Clone)]
pub struct UsageRecorderConfig {
    /// How often dirty state is written back to the store.
    pub flush_interval: Duration,
    /// Force a flush once this many updates are pending.
    pub max_pending: usize,
}

impl Default for UsageRecorderConfig {
    fn default() -> Self {
        Self {
            flush_interval: Duration::from_secs(5),
            max_pending: 256,
        }
    }
}

enum Signal {
    Bump,
    Flush(oneshot::Sender<Result<(), StoreError>>),
}

/// Counters exposed by the recorder, mirrored into `/health`.
#[derive(Debug, Default)]
struct RecorderCounters {
    updates: AtomicU64,
    unknown_user_updates: AtomicU64,
    flushes: AtomicU64,
    flush_failures: AtomicU64,
    /// False while the in-memory registry is ahead of durable state.
    last_flush_ok: AtomicBool,
}

/// Snapshot of [`UsageRecorder`] counters.
#[derive(Debug, Clone, Copy)]
pub struct RecorderStats {
    pub updates: u64,
    pub unknown_user_updates: u64,
    pub flushes: u64,
    pub flush_failures: u64,
    /// Whether the most recent flush persisted successfully.
    pub last_flush_ok: bool,
}

/// The accounting hook: applies usage deltas and keeps the store in sync.
pub struct UsageRecorder {
    registry: Arc<Registry>,
    tx: mpsc::UnboundedSender<Signal>,
    counters: Arc<RecorderCounters>,
}

impl UsageRecorder {
    /// Spawn the background flusher and return the recorder handle.
    pub fn spawn(
        registry: Arc<Registry>,
        store: RegistryStore,
        config: UsageRecorderConfig,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let counters = Arc::new(RecorderCounters {
            last_flush_ok: AtomicBool::new(true),
            ..RecorderCounters::default()
        });

        tokio::spawn(flush_loop(
            Arc::clone(&registry),
            store,
            config,
            rx,
            Arc::clone(&counters),
        ));

        Self {
            registry,
            tx,
            counters,
        }
    }

    /// Apply an upload/download increment for `username`.
    ///
    /// The in-memory update is atomic with respect to concurrent
    /// authentication reads; persistence follows within the durability
    /// window. Returns `false` for an unknown username.
    pub fn record_usage(&self, username: &str, upload_delta: u64, download_delta: u64) -> bool {
        if !self.registry.record_usage(username, upload_delta, download_delta) {
            self.counters
                .unknown_user_updates
                .fetch_add(1, Ordering::Relaxed);
            warn!(user = username, "usage report for unknown user dropped");
            return false;
        }
        self.counters.updates.fetch_add(1, Ordering::Relaxed);
        let _ = self.tx.send(Signal::Bump);
        true
    }

    /// Force pending state to disk and wait for the result.
    ///
    /// Used by reload (so a registry swap never reverts accounted bytes)
    /// and by graceful shutdown.
    pub async fn flush(&self) -> Result<(), StoreError> {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(Signal::Flush(done_tx)).is_err() {
            // Flusher already gone (shutdown); nothing left to persist.
            return Ok(());
        }
        done_rx.await.unwrap_or(Ok(()))
    }

    /// Current recorder counters.
    pub fn stats(&self) -> RecorderStats {
        RecorderStats {
            updates: self.counters.updates.load(Ordering::Relaxed),
            unknown_user_updates: self.counters.unknown_user_updates.load(Ordering::Relaxed),
            flushes: self.counters.flushes.load(Ordering::Relaxed),
            flush_failures: self.counters.flush_failures.load(Ordering::Relaxed),
            last_flush_ok: self.counters.last_flush_ok.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for UsageRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageRecorder").finish_non_exhaustive()
    }
}

async fn flush_loop(
    registry: Arc<Registry>,
    store: RegistryStore,
    config: UsageRecorderConfig,
    mut rx: mpsc::UnboundedReceiver<Signal>,
    counters: Arc<RecorderCounters>,
) {
    let mut ticker = tokio::time::interval(config.flush_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut pending: usize = 0;

    loop {
        tokio::select! {
            signal = rx.recv() => match signal {
                Some(Signal::Bump) => {
                    pending += 1;
                    if pending >= config.max_pending {
                        let _ = flush_once(&registry, &store, &counters).await;
                        pending = 0;
                    }
                }
                Some(Signal::Flush(done)) => {
                    let result = if pending > 0 {
                        flush_once(&registry, &store, &counters).await
                    } else {
                        Ok(())
                    };
                    pending = 0;
                    let _ = done.send(result);
                }
                None => {
                    // Recorder dropped: final flush, then exit.
                    if pending > 0 {
                        let _ = flush_once(&registry, &store, &counters).await;
                    }
                    break;
                }
            },
            _ = ticker.tick() => {
                if pending > 0 {
                    let _ = flush_once(&registry, &store, &counters).await;
                    pending = 0;
                }
            }
        }
    }
}

async fn flush_once(
    registry: &Registry,
    store: &RegistryStore,
    counters: &RecorderCounters,
) -> Result<(), StoreError> {
    // Snapshot under the read lock, serialize and write outside it.
    let snapshot = registry.snapshot();
    match store.save(&snapshot).await {
        Ok(()) => {
            counters.flushes.fetch_add(1, Ordering::Relaxed);
            counters.last_flush_ok.store(true, Ordering::Relaxed);
            debug!(users = snapshot.len(), "usage flushed to registry file");
            Ok(())
        }
        Err(e) => {
            counters.flush_failures.fetch_add(1, Ordering::Relaxed);
            counters.last_flush_ok.store(false, Ordering::Relaxed);
            // Memory stays authoritative; durable state is behind until
            // the next tick retries.
            warn!(error = %e, "usage flush failed, registry file is stale");
            Err(e)
        }
    }
}
