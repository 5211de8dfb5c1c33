use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::api::state::SharedState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
    store: String,
}

pub async fn health(State(state): State<SharedState>) -> impl IntoResponse {
    let store_healthy = state.resolver.store_healthy().await;

    let health_response = HealthResponse {
        status: if store_healthy { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: if store_healthy { "up" } else { "down" }.to_string(),
    };

    if !store_healthy {
        tracing::warn!("健康檢查: 內部儲存不可用");
    }

    let status = if store_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(health_response))
}
