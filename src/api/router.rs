use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;
use super::auth::require_auth;
use super::handlers;

pub fn create_router(state: AppState) -> Router {
    // Public routes (no authentication)
    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render));

    // Protected API routes (Bearer token when API_TOKEN is set)
    let protected = Router::new()
        // Traders
        .route("/api/traders", get(handlers::traders::list))
        .route("/api/traders/count", get(handlers::traders::count))
        .route("/api/accounts/:account", get(handlers::traders::detail))
        // Explorer state
        .route("/api/explorer/state", get(handlers::explorer::state))
        .route("/api/explorer/filters", post(handlers::explorer::change_filters))
        .route("/api/explorer/tab", post(handlers::explorer::change_tab))
        .route("/api/explorer/labels", post(handlers::explorer::change_labels))
        .route("/api/explorer/page", post(handlers::explorer::change_page))
        .route(
            "/api/explorer/layout",
            get(handlers::explorer::get_layout).put(handlers::explorer::put_layout),
        )
        // WebSocket count session
        .route("/ws", get(handlers::ws::handler))
        .layer(middleware::from_fn(require_auth));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
