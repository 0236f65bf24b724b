use crate::{handlers, AppState};
use axum::{http::Method, routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // Comparison matrix and statistics
        .route("/api/compare", get(handlers::compare))
        .route("/api/compare/stats", get(handlers::compare_stats))
        // Entities
        .route("/api/agent", get(handlers::list_agents))
        .route("/api/agent/{slug}", get(handlers::get_agent))
        .route("/api/feature", get(handlers::list_features))
        .route("/api/feature/{slug}", get(handlers::get_feature))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::OPTIONS])
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
