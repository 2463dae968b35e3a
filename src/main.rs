mod core;
mod features;
mod modules;
mod shared;

use crate::core::access::AccessPolicy;
use crate::core::config::Config;
use crate::core::middleware::{self, RequestLoggerState};
use crate::features::health::routes as health_routes;
use crate::features::pages::routes as pages_routes;
use crate::features::photos::{routes as photos_routes, PhotoService};
use crate::modules::request_log::RequestLog;
use crate::modules::storage::PhotoStore;
use axum::{middleware::from_fn_with_state, Router};
use std::sync::Arc;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    // Log system info
    let available_cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);
    tracing::info!(
        "System info: available_cpus={}, tokio_worker_threads={}, pid={}",
        available_cpus,
        worker_threads,
        std::process::id()
    );

    tracing::info!("Configuration loaded successfully");

    // Build the static access policy; malformed rules refuse startup
    let access_policy =
        Arc::new(AccessPolicy::from_config(&config.access).map_err(|e| anyhow::anyhow!(e))?);
    tracing::info!(
        "Access policy loaded: {} allowed networks, {} blocked addresses",
        access_policy.allowed_network_count(),
        access_policy.blocked_address_count()
    );

    // Open the append-only request log
    let request_log = Arc::new(RequestLog::open(&config.request_log.file)?);
    tracing::info!("Request log opened: {}", config.request_log.file.display());

    // Initialize photo storage
    let photo_store = PhotoStore::new(config.storage.photos_dir());
    photo_store.ensure_dir().await?;
    tracing::info!("Photo storage ready: {}", photo_store.base_dir().display());
    let photo_service = Arc::new(PhotoService::new(photo_store, "/static/photos"));

    let logger_state = RequestLoggerState {
        log: Arc::clone(&request_log),
        body_limit: config.app.max_upload_bytes + 1024 * 1024,
    };

    // API routes share the filter chain: access control first, then the
    // request logger, then the handler.
    let api_routes = Router::new()
        .merge(pages_routes())
        .merge(photos_routes(
            Arc::clone(&photo_service),
            config.app.max_upload_bytes,
        ))
        .merge(health_routes())
        .layer(from_fn_with_state(logger_state, middleware::request_logger))
        .layer(from_fn_with_state(
            Arc::clone(&access_policy),
            middleware::ip_filter,
        ));

    // Static assets (including stored photos) are served outside the filters
    let app = Router::new()
        .merge(api_routes)
        .nest_service("/static", ServeDir::new(&config.storage.static_dir))
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid));

    // Start server
    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nodelay(true)?;

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on {}", format!("http://{}", addr));

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
