pub mod advisor;
pub mod config;
pub mod error;
pub mod handlers;
pub mod outcome;
pub mod page;
pub mod state;
pub mod upload;
pub mod workspace;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use state::SharedState;
use tower_http::{cors::CorsLayer, services::ServeDir};

/// Upload ceiling for a single request body.
pub const MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

pub fn app(state: SharedState) -> Router {
    let assets = ServeDir::new(&state.config.assets_dir);

    Router::new()
        .route("/", get(handlers::index))
        .route("/upload", post(handlers::upload))
        .route("/generate", post(handlers::generate))
        .route("/api/upload", post(handlers::api_upload))
        .route("/api/advise", post(handlers::api_advise))
        .route("/health", get(handlers::health))
        .nest_service("/logo", assets)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
