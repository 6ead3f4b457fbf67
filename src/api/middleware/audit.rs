//! Request logging middleware.
//!
//! Logs method, path, status, and latency for every request under a span
//! carrying a fresh request id, which is also returned in `x-request-id`.
//! Bodies are never logged: they carry health data.

use std::time::Instant;

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub async fn log_request(req: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %path
    );
    let mut response = next.run(req).instrument(span).await;

    let status = response.status().as_u16();
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    if response.status().is_server_error() {
        tracing::error!(%request_id, %method, %path, status, latency_ms, "Request failed");
    } else if response.status().is_client_error() {
        tracing::warn!(%request_id, %method, %path, status, latency_ms, "Request rejected");
    } else {
        tracing::info!(%request_id, %method, %path, status, latency_ms, "Request completed");
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
