pub mod error;
pub mod handlers;
pub mod state;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::*;

pub use error::AppError;
pub use state::{listen_addr, load_config, AppState, BuildInfo, DEFAULT_MAX_BODY_BYTES};

/// Routes: `/healthz` is public, everything under `/api/v1` sits behind the
/// bearer token check.
pub fn build_router(state: Arc<AppState>) -> Router {
    let machine_routes = Router::new()
        .route("/machines", get(list_machines).post(create_machine))
        .route(
            "/machines/:id",
            get(get_machine).put(update_machine).delete(delete_machine),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_token));

    Router::new()
        .route("/healthz", get(health))
        .nest("/api/v1", machine_routes)
        .layer(DefaultBodyLimit::max(state.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
