use axum::Router;

use crate::api::state::SharedState;

pub mod candles;
pub mod system;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .merge(candles::routes())
        .merge(system::routes())
}
