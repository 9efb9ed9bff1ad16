use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::AppState;

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "moodlog-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Not ready while the store cannot write: changes would be lost on restart.
pub async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let store = state.store.read().await;
    let entries = store.len();
    let backend = store.backend();

    if store.is_durable() {
        (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "checks": { "storage": "ok" },
                "backend": backend,
                "entries": entries,
            })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "not_ready",
                "checks": { "storage": "failed" },
                "backend": backend,
                "entries": entries,
            })),
        )
    }
}
