// src/api/routes/system.rs
use axum::{routing::get, Router};

use crate::api::handlers::system;
use crate::api::state::SharedState;

pub fn routes() -> Router<SharedState> {
    Router::new().route("/system/health", get(system::health))
}
