use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::errors::AppError;
use crate::state::AppState;

pub mod handlers;
pub mod validators;

/// Build the REST router with its state attached.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health endpoints (no auth)
        .route("/healthz", get(|| async { "ok" }))
        .route("/readyz", get(|| async { "ok" }))
        .route("/users", post(handlers::register_user))
        .route(
            "/authentications",
            post(handlers::login)
                .put(handlers::refresh)
                .delete(handlers::logout),
        )
        .route(
            "/playlists",
            get(handlers::list_playlists).post(handlers::create_playlist),
        )
        .route(
            "/playlists/:id",
            get(handlers::get_playlist).delete(handlers::delete_playlist),
        )
        .route("/export/playlists/:id", post(handlers::export_playlist))
        .fallback(fallback_404)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn fallback_404() -> AppError {
    AppError::NotFound("route not found".into())
}
