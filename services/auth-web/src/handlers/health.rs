//! Liveness and readiness probes

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use std::time::Instant;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Probe {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_store: Option<StoreCheck>,
}

#[derive(Debug, Serialize)]
pub struct StoreCheck {
    pub reachable: bool,
    pub latency_ms: u64,
}

/// GET /health
pub async fn health() -> Json<Probe> {
    Json(Probe {
        status: "healthy",
        user_store: None,
    })
}

/// GET /ready - 503 unless the user store answers a ping within the store timeout
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Probe>) {
    let started = Instant::now();
    let ping = tokio::time::timeout(state.config.auth.store_timeout, state.users.ping()).await;
    let latency_ms = started.elapsed().as_millis() as u64;

    let reachable = match ping {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, latency_ms, "User store ping failed");
            false
        }
        Err(_) => {
            tracing::warn!(latency_ms, "User store ping timed out");
            false
        }
    };

    let (code, status) = if reachable {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };
    (
        code,
        Json(Probe {
            status,
            user_store: Some(StoreCheck {
                reachable,
                latency_ms,
            }),
        }),
    )
}
