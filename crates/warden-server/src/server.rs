//! Router assembly and serving.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;
use warden_auth::{
    CorruptPolicy, LoadSource, Registry, RegistryStore, UsageRecorder, UsageRecorderConfig,
};
use warden_config::Config;

use crate::error::ServerError;
use crate::handler;
use crate::state::{AppState, HealthState};

/// Load the registry and assemble the shared state.
///
/// Under `on_corrupt = "fail"` a corrupt registry file refuses startup;
/// the default policy starts degraded on an empty registry instead.
pub async fn build_state(config: &Config) -> Result<AppState, ServerError> {
    let on_corrupt = match config.registry.on_corrupt.as_str() {
        "fail" => CorruptPolicy::Fail,
        _ => CorruptPolicy::Empty,
    };
    let store = RegistryStore::new(
        &config.registry.path,
        Duration::from_secs(config.registry.io_timeout_secs),
        on_corrupt,
    );

    let outcome = store.load().await?;
    if outcome.source == LoadSource::CorruptFile {
        warden_metrics::record_registry_load_corrupt();
    }
    let users = outcome.accounts.len();
    info!(
        users,
        path = %store.path().display(),
        "registry loaded"
    );
    warden_metrics::set_registry_users(users);

    let health = Arc::new(HealthState::new(outcome.source));
    let registry = Arc::new(Registry::from_accounts(outcome.accounts));
    let recorder = Arc::new(UsageRecorder::spawn(
        Arc::clone(&registry),
        store.clone(),
        UsageRecorderConfig {
            flush_interval: Duration::from_secs(config.registry.flush_interval_secs),
            max_pending: config.registry.flush_max_pending,
        },
    ));

    Ok(AppState {
        registry,
        store,
        recorder,
        health,
    })
}

/// Build the endpoint router.
pub(crate) fn routes(state: AppState) -> Router {
    Router::new()
        .route("/auth", post(handler::handle_auth))
        .route("/usage", post(handler::handle_usage))
        .route("/health", get(handler::handle_health))
        .route("/reload", post(handler::handle_reload))
        .with_state(state)
}

/// Bind `listen` and serve until the token is cancelled.
pub async fn serve(
    state: AppState,
    listen: &str,
    shutdown: CancellationToken,
) -> Result<(), ServerError> {
    let listener = TcpListener::bind(listen).await?;
    serve_on(state, listener, shutdown).await
}

/// Serve on an already-bound listener until the token is cancelled.
///
/// On shutdown, pending usage is flushed so accounted bytes survive a
/// clean stop.
pub async fn serve_on(
    state: AppState,
    listener: TcpListener,
    shutdown: CancellationToken,
) -> Result<(), ServerError> {
    let addr = listener.local_addr()?;
    info!("auth endpoint listening on {addr}");

    let recorder = Arc::clone(&state.recorder);
    let app = routes(state).into_make_service_with_connect_info::<SocketAddr>();

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    recorder.flush().await?;
    Ok(())
}
