use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}

pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    let store_ok = match state.store.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "store health check failed");
            false
        }
    };
    let status = if store_ok { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    let body = json!({
        "status": if store_ok { "ok" } else { "degraded" },
        "store": store_ok,
        "cache_enabled": state.cache.is_enabled(),
        "cache": state.cache.is_reachable().await,
    });
    (status, Json(body))
}
