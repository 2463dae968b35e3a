use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::photos::handlers::{list_photos, upload_photo};
use crate::features::photos::services::PhotoService;

/// Create routes for the photos feature
pub fn routes(photo_service: Arc<PhotoService>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/photos", get(list_photos))
        .route(
            "/upload",
            // Allow body size up to the upload limit + buffer for multipart overhead
            post(upload_photo).layer(DefaultBodyLimit::max(max_upload_bytes + 1024 * 1024)),
        )
        .with_state(photo_service)
}
