use std::sync::Arc;

use axum::{
    http::{Method, StatusCode},
    middleware,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    middleware::{make_span_with_request_id, request_id_middleware},
    services::SubtitleService,
};

pub mod manifest;
pub mod subtitles;

/// Shared application state
pub struct AppState {
    pub subtitles: SubtitleService,
    /// Scheme and host players can reach us at, for the fallback subtitle URL
    pub public_base_url: String,
}

impl AppState {
    pub fn new(subtitles: SubtitleService, public_base_url: impl Into<String>) -> Self {
        Self {
            subtitles,
            public_base_url: public_base_url.into(),
        }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/manifest.json", get(manifest::manifest))
        .route("/loading.srt", get(subtitles::loading_subtitle))
        .route("/:config/manifest.json", get(manifest::configured_manifest))
        .route(
            "/:config/subtitles/:media_type/:id",
            get(subtitles::get_subtitles),
        )
        .route(
            "/:config/subtitles/:media_type/:id/:extra",
            get(subtitles::get_subtitles_with_extra),
        )
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                // Players fetch add-on resources cross-origin
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods([Method::GET])
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
