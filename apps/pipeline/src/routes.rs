// [apps/pipeline/src/routes.rs]
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{discovery, finalize, gateway, process};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/discovery", post(discovery::handle_discovery))
        .route("/gateway", post(gateway::handle_gateway))
        .route("/process", post(process::handle_process))
        .route("/finalize", post(finalize::handle_finalize))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
