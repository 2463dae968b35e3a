#[cfg(test)]
use std::path::PathBuf;
#[cfg(test)]
use std::sync::Arc;

#[cfg(test)]
use axum::{middleware::from_fn_with_state, Router};
#[cfg(test)]
use tower_http::services::ServeDir;
#[cfg(test)]
use uuid::Uuid;

#[cfg(test)]
use crate::core::access::AccessPolicy;
#[cfg(test)]
use crate::core::config::AccessConfig;
#[cfg(test)]
use crate::core::middleware::{self, RequestLoggerState};
#[cfg(test)]
use crate::features::{health, pages, photos};
#[cfg(test)]
use crate::modules::request_log::RequestLog;
#[cfg(test)]
use crate::modules::storage::PhotoStore;

/// Temporary on-disk layout backing one test app. The directory tree is
/// removed on drop.
#[cfg(test)]
pub struct TestContext {
    root: PathBuf,
}

#[cfg(test)]
impl TestContext {
    pub fn photos_dir(&self) -> PathBuf {
        self.root.join("static").join("photos")
    }

    pub fn log_file(&self) -> PathBuf {
        self.root.join("logs").join("requests.log")
    }
}

#[cfg(test)]
impl Drop for TestContext {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

/// Build an app wired exactly like `main`, but over a throwaway directory
/// and the given access rules. Tests pick their client address with an
/// `X-Forwarded-For` header.
#[cfg(test)]
pub fn test_app(allowed_networks: &[&str], blocked_addresses: &[&str]) -> (Router, TestContext) {
    let root = std::env::temp_dir().join(format!("photowall-test-{}", Uuid::new_v4()));
    let ctx = TestContext { root };

    let access_policy = Arc::new(
        AccessPolicy::from_config(&AccessConfig {
            allowed_networks: allowed_networks.iter().map(|s| s.to_string()).collect(),
            blocked_addresses: blocked_addresses.iter().map(|s| s.to_string()).collect(),
        })
        .expect("test access rules are valid"),
    );

    let request_log = Arc::new(RequestLog::open(&ctx.log_file()).expect("test log file opens"));
    let photo_service = Arc::new(photos::PhotoService::new(
        PhotoStore::new(ctx.photos_dir()),
        "/static/photos",
    ));

    let max_upload_bytes = 10 * 1024 * 1024;
    let logger_state = RequestLoggerState {
        log: request_log,
        body_limit: max_upload_bytes + 1024 * 1024,
    };

    let app = Router::new()
        .merge(pages::routes())
        .merge(photos::routes(photo_service, max_upload_bytes))
        .merge(health::routes())
        .layer(from_fn_with_state(logger_state, middleware::request_logger))
        .layer(from_fn_with_state(access_policy, middleware::ip_filter))
        .nest_service("/static", ServeDir::new(ctx.root.join("static")));

    (app, ctx)
}
