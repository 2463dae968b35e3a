use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, MatchedPath, Request, State},
    http::{header, Extensions, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Span;
use uuid::Uuid;

use crate::core::access::AccessPolicy;
use crate::modules::request_log::{RequestLog, RequestLogEntry};

/// Request ID generator using UUID v7 (time-ordered)
#[derive(Clone, Copy)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string();
        Some(RequestId::new(HeaderValue::from_str(&id).unwrap()))
    }
}

/// Custom MakeSpan that includes request_id in the tracing span
#[derive(Clone, Debug)]
pub struct MakeSpanWithRequestId;

impl<B> tower_http::trace::MakeSpan<B> for MakeSpanWithRequestId {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    }
}

pub fn cors_layer(allowed_origins: Vec<String>) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    // If origins list contains "*", allow any origin
    if allowed_origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        // Parse origins into HeaderValue
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(AllowOrigin::list(origins))
    }
}

/// Resolve the caller's address: forwarded headers first, then the peer
/// address from the connection. An X-Forwarded-For that is present but
/// malformed resolves to nothing, so the filter fails closed.
fn resolve_client_ip(headers: &HeaderMap, extensions: &Extensions) -> Option<IpAddr> {
    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
    {
        return forwarded
            .split(',')
            .next()
            .and_then(|first| first.trim().parse().ok());
    }

    if let Some(real_ip) = headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
    {
        return real_ip.trim().parse().ok();
    }

    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

/// Reject disallowed callers before any handler logic runs.
///
/// 403 carries no body detail. A request whose client address cannot be
/// resolved at all is also rejected.
pub async fn ip_filter(
    State(policy): State<Arc<AccessPolicy>>,
    req: Request,
    next: Next,
) -> Response {
    match resolve_client_ip(req.headers(), req.extensions()) {
        Some(addr) if policy.permits(addr) => next.run(req).await,
        Some(addr) => {
            tracing::debug!("Rejected request from {}", addr);
            StatusCode::FORBIDDEN.into_response()
        }
        None => {
            tracing::debug!("Rejected request with unresolvable client address");
            StatusCode::FORBIDDEN.into_response()
        }
    }
}

#[derive(Clone)]
pub struct RequestLoggerState {
    pub log: Arc<RequestLog>,
    /// Upper bound for buffering the body; matches the upload route limit
    pub body_limit: usize,
}

/// Capture one structured record per filtered request, then hand the request
/// on unchanged. Runs after the IP filter and before the handlers.
pub async fn request_logger(
    State(state): State<RequestLoggerState>,
    req: Request,
    next: Next,
) -> Response {
    let (parts, body) = req.into_parts();

    let bytes = match axum::body::to_bytes(body, state.body_limit).await {
        Ok(bytes) => bytes,
        // The upload route would reject this size anyway; answer for it here
        // since the original body can no longer be replayed.
        Err(_) => return StatusCode::PAYLOAD_TOO_LARGE.into_response(),
    };

    let endpoint = parts
        .extensions
        .get::<MatchedPath>()
        .map(|matched| endpoint_name(matched.as_str()).to_string())
        .unwrap_or_else(|| parts.uri.path().to_string());

    let client_ip = resolve_client_ip(&parts.headers, &parts.extensions)
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let entry = RequestLogEntry {
        timestamp: Utc::now(),
        endpoint,
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        client_ip,
        headers: header_map(&parts.headers),
        query: query_map(parts.uri.query()),
        body: capture_body(&parts.headers, &bytes),
    };
    state.log.append(&entry);

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

/// Stable record names for the known routes; unknown routes log their path.
fn endpoint_name(route: &str) -> &str {
    match route {
        "/" => "index",
        "/photos" => "photos",
        "/upload" => "upload",
        "/online" => "online",
        other => other,
    }
}

fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}

fn query_map(query: Option<&str>) -> BTreeMap<String, String> {
    query
        .and_then(|q| serde_urlencoded::from_str(q).ok())
        .unwrap_or_default()
}

/// Serialize the body for the log record. Priority order: structured JSON,
/// form fields, raw text, the "no body" marker, an error placeholder when
/// parsing fails.
fn capture_body(headers: &HeaderMap, bytes: &[u8]) -> serde_json::Value {
    if bytes.is_empty() {
        return serde_json::Value::String("no body".to_string());
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    if content_type.starts_with("application/json") {
        return match serde_json::from_slice(bytes) {
            Ok(value) => value,
            Err(err) => serde_json::Value::String(format!("Error parsing body: {}", err)),
        };
    }

    if content_type.starts_with("application/x-www-form-urlencoded") {
        return match serde_urlencoded::from_bytes::<BTreeMap<String, String>>(bytes) {
            Ok(fields) => serde_json::to_value(fields)
                .unwrap_or_else(|err| serde_json::Value::String(format!("Error parsing body: {}", err))),
            Err(err) => serde_json::Value::String(format!("Error parsing body: {}", err)),
        };
    }

    serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned())
}
