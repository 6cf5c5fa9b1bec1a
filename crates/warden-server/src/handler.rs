//! HTTP handlers for the authentication endpoint.

use std::net::SocketAddr;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::{Value, json};
use time::OffsetDateTime;
use tracing::{debug, warn};
use warden_auth::evaluate;

use crate::reload;
use crate::state::AppState;

type AuthReply = (StatusCode, Json<Value>);

fn rejected(status: StatusCode, msg: &str) -> AuthReply {
    (status, Json(json!({"ok": false, "msg": msg})))
}

/// `POST /auth` — the per-connection decision the proxy server waits on.
///
/// Body: `{"auth": "<username>:<password>"}`; extra fields the proxy sends
/// (peer address, handshake bytes) are ignored. The body is parsed by hand
/// so malformed input maps to the fixed 400 contract instead of the
/// extractor's own rejection shape.
pub(crate) async fn handle_auth(State(state): State<AppState>, body: Bytes) -> AuthReply {
    let Ok(request) = serde_json::from_slice::<Value>(&body) else {
        warden_metrics::record_auth_bad_request();
        return rejected(StatusCode::BAD_REQUEST, "Invalid request format");
    };

    let auth = match request.get("auth") {
        None | Some(Value::Null) => {
            warden_metrics::record_auth_bad_request();
            return rejected(StatusCode::BAD_REQUEST, "Auth field missing");
        }
        Some(Value::String(s)) if s.is_empty() => {
            warden_metrics::record_auth_bad_request();
            return rejected(StatusCode::BAD_REQUEST, "Auth field missing");
        }
        Some(Value::String(s)) => s.as_str(),
        Some(_) => {
            warden_metrics::record_auth_bad_request();
            return rejected(StatusCode::BAD_REQUEST, "Invalid request format");
        }
    };

    // Split on the FIRST colon only: passwords may contain colons.
    let Some((username, password)) = auth.split_once(':') else {
        warden_metrics::record_auth_bad_request();
        return rejected(StatusCode::BAD_REQUEST, "Invalid request format");
    };

    // Lookup clones the record out of the cache; evaluation runs on the
    // clone with no lock held and no I/O.
    let account = state.registry.get(username);
    let today = OffsetDateTime::now_utc().date();
    let decision = evaluate(account.as_ref(), password, today);

    if decision.is_allowed() {
        warden_metrics::record_auth_success();
        debug!(user = username, "authentication accepted");
        (StatusCode::OK, Json(json!({"ok": true, "id": username})))
    } else {
        warden_metrics::record_auth_reject(decision.label());
        debug!(user = username, reason = decision.label(), "authentication rejected");
        rejected(StatusCode::UNAUTHORIZED, decision.reason())
    }
}

/// Usage report from the proxy's traffic channel.
#[derive(Debug, Deserialize)]
pub(crate) struct UsageReport {
    pub username: String,
    #[serde(default)]
    pub upload_bytes: u64,
    #[serde(default)]
    pub download_bytes: u64,
}

/// `POST /usage` — out-of-band traffic accounting.
pub(crate) async fn handle_usage(
    State(state): State<AppState>,
    Json(report): Json<UsageReport>,
) -> AuthReply {
    let applied = state.recorder.record_usage(
        &report.username,
        report.upload_bytes,
        report.download_bytes,
    );
    if applied {
        warden_metrics::record_usage_update();
        (StatusCode::OK, Json(json!({"ok": true})))
    } else {
        warden_metrics::record_usage_unknown_user();
        rejected(StatusCode::NOT_FOUND, "User not found")
    }
}

/// `GET /health` — distinguishes a legitimately empty registry from a
/// corrupt-file fallback (degraded, 503), and surfaces whether the last
/// usage flush reached disk.
pub(crate) async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.recorder.stats();
    let degraded = state.health.is_degraded();

    let status = if degraded {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (
        status,
        Json(json!({
            "status": if degraded { "degraded" } else { "ok" },
            "users": state.registry.len(),
            "registry_source": state.health.source_label(),
            "usage_flush_ok": stats.last_flush_ok,
            "usage_updates": stats.updates,
            "flush_failures": stats.flush_failures,
        })),
    )
}

/// `POST /reload` — swap in the registry file's current contents.
/// Administrative, so only loopback peers may call it.
pub(crate) async fn handle_reload(
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> AuthReply {
    if !peer.ip().is_loopback() {
        return rejected(
            StatusCode::FORBIDDEN,
            "reload is only accessible from localhost",
        );
    }

    match reload::reload(&state).await {
        Ok(summary) => (
            StatusCode::OK,
            Json(json!({
                "ok": true,
                "users": summary.users,
                "registry_source": state.health.source_label(),
            })),
        ),
        Err(e) => {
            warn!(error = %e, "reload failed");
            rejected(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}
