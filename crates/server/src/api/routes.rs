use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{groups, handlers, media};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Media ingest and lookup
        .route("/media", post(media::ingest))
        .route("/media/{id}", get(media::get_record))
        // Federated search
        .route("/search", post(media::search))
        .route("/search/grouped", post(media::search_grouped))
        // Saved groups
        .route("/groups/{name}", put(groups::save_group))
        .route("/groups/{name}", get(groups::get_group))
        .route("/groups/{name}", delete(groups::delete_group));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
