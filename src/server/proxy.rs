// memgate: reverse-proxy passthrough for the "proxy" TimeGate disposition
//
// spec.md scopes the embedded reverse proxy's content-rewriting to an
// external collaborator; this crate owns only the URL rewrite (§uri.rs) and
// the passthrough fetch+stream. Grounded on the wayback client in
// other_examples' discourse-rss-auto-archive-linked-content for idiomatic
// reqwest streaming-body handling.

use axum::body::Body;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use reqwest::Client;

/// Fetch `rewritten_location` (already carrying the `id_` raw-content
/// modifier) and stream its body straight back to the caller (§4.9 "proxy").
pub async fn stream_proxy(client: &Client, rewritten_location: &str) -> Response {
    let upstream = match client.get(rewritten_location).send().await {
        Ok(resp) => resp,
        Err(e) => {
            return (StatusCode::BAD_GATEWAY, format!("proxy fetch failed: {e}")).into_response();
        }
    };

    let status = StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    // reqwest (http 0.2 types) and axum (http 1.0 types) don't share a
    // HeaderValue type, so re-stringify rather than passing the header
    // value straight through.
    let content_type = upstream
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let body = Body::from_stream(upstream.bytes_stream());
    let mut response = Response::builder().status(status);
    if let Some(ct) = content_type {
        response = response.header(axum::http::header::CONTENT_TYPE, ct);
    }
    response
        .body(body)
        .unwrap_or_else(|_| (StatusCode::INTERNAL_SERVER_ERROR, "failed to build proxy response").into_response())
}
