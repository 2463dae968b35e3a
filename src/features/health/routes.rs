use axum::{routing::get, Router};

use crate::features::health::handlers::online;

/// Create the liveness route
pub fn routes() -> Router {
    Router::new().route("/online", get(online))
}
