mod handlers;
mod middleware;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub use middleware::{RateLimiter, SecurityConfig};

/// Router without authentication, for local use and tests.
pub fn create_router(state: AppState) -> Router {
    create_router_with_config(state, SecurityConfig::disabled())
}

pub fn create_router_with_config(state: AppState, security: SecurityConfig) -> Router {
    let mut api = Router::new()
        // Assistant
        .route(
            "/assistant/{session_id}",
            post(handlers::assistant_turn)
                .get(handlers::get_conversation)
                .delete(handlers::reset_conversation),
        )
        .route(
            "/assistant/{session_id}/report",
            post(handlers::generate_conversation_report),
        )
        .route("/validate", post(handlers::validate_input))
        // Reports
        .route(
            "/reports",
            post(handlers::generate_report).get(handlers::list_reports),
        )
        .route(
            "/reports/{id}",
            get(handlers::get_report).delete(handlers::delete_report),
        )
        .route(
            "/reports/{id}/outline",
            post(handlers::create_outline_from_report),
        )
        // Retrieval
        .route("/search", post(handlers::search))
        .route(
            "/references",
            post(handlers::upload_reference).get(handlers::list_references),
        )
        .route(
            "/references/{id}",
            axum::routing::delete(handlers::delete_reference),
        )
        .route("/exports", post(handlers::export_document))
        // Outlines
        .route(
            "/outlines",
            post(handlers::create_outline).get(handlers::list_outlines),
        )
        .route(
            "/outlines/{id}",
            get(handlers::get_outline).delete(handlers::delete_outline),
        )
        .route("/outlines/{id}/sections", post(handlers::add_section))
        .route(
            "/outlines/{id}/nodes/{node_id}",
            put(handlers::update_node_text).delete(handlers::delete_node),
        )
        .route("/outlines/{id}/stats", get(handlers::outline_stats))
        .route("/outlines/{id}/tree", get(handlers::outline_tree))
        .route("/outlines/{id}/commands", post(handlers::run_command))
        .route("/outlines/{id}/export", get(handlers::export_outline));

    if let Some(limiter) = security.rate_limiter.clone() {
        api = api.layer(from_fn_with_state(limiter, middleware::rate_limit_middleware));
    }
    let api = api
        .layer(from_fn_with_state(security.clone(), middleware::auth_middleware))
        // Added after the layers, so health stays reachable without credentials.
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(security.cors_layer())
        .with_state(state)
}
