pub mod accounts;
pub mod balances;
pub mod health;
pub(crate) mod params;

use axum::http::Method;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

/// Any origin may read; the charting GUI posts JSON bodies from its own host.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(balances::router())
        .merge(accounts::router())
        .merge(crate::openapi::router())
        .with_state(state)
}
