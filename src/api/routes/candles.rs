use axum::{routing::get, Router};

use crate::api::handlers::candles;
use crate::api::state::SharedState;

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/candles", get(candles::get_candles))
        .route("/dashboard/candles", get(candles::get_dashboard_candles))
        .route("/developer/candles", get(candles::get_developer_candles))
        .route("/developer/candles/batch", get(candles::get_developer_candles_batch))
}
