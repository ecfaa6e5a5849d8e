use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::routes::{analytics, imports, prices};
use crate::services::rate_limiter::limit_by_client_ip;
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::<AppState>::new()
        .route("/health", get(health))
        .nest("/api/crypto", prices::router().merge(analytics::router()))
        .nest("/api/upload", imports::router())
        .layer(middleware::from_fn_with_state(state.clone(), limit_by_client_ip))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str {
    debug!("GET /health - Health check");
    "OK"
}
