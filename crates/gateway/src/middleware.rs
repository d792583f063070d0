//! Handshake extraction and cross-cutting layers

use axum::http::{header, HeaderMap, Method};
use huddle_realtime::Handshake;
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Debug, Default, Deserialize)]
pub struct WebSocketQuery {
    pub token: Option<String>,
}

/// Build the handshake from `?token=`, falling back to `Authorization: Bearer`.
pub fn handshake_from(query: WebSocketQuery, headers: &HeaderMap) -> Handshake {
    let query_token = query.token.filter(|token| !token.trim().is_empty());
    let token = query_token.or_else(|| bearer_token(headers).map(str::to_string));
    Handshake { token }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// Create tracing middleware
pub fn create_trace_middleware(
) -> TraceLayer<tower_http::classify::SharedClassifier<tower_http::classify::ServerErrorsAsFailures>>
{
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::INFO))
}

pub fn create_cors_middleware() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE])
}
