use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;
use crate::middleware::{make_span_with_request_id, request_id_middleware};

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api", api_routes())
        .with_state(state)
        // Request id first, so the trace span can pick it up
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
}

/// Routes under /api
fn api_routes() -> Router<AppState> {
    Router::new()
        // Library
        .route(
            "/games",
            get(handlers::list_games).post(handlers::add_game),
        )
        .route(
            "/games/:id",
            get(handlers::get_game)
                .patch(handlers::update_game)
                .put(handlers::update_game)
                .delete(handlers::delete_game),
        )
        .route(
            "/games/:id/screenshots",
            post(handlers::add_screenshots).delete(handlers::remove_screenshot),
        )
        // Derived views
        .route("/games/:id/similar", get(handlers::get_similar))
        .route("/analytics", get(handlers::get_analytics))
        // Catalog
        .route("/search", get(handlers::search_catalog))
        .route("/catalog/:catalog_id", get(handlers::get_catalog_details))
        .route("/popular", get(handlers::get_popular))
        .route("/trailer", get(handlers::get_trailer))
}
