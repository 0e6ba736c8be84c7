//! Middleware for the ifc2glb API
//!
//! Provides request logging with duration tracking.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{error, info, warn};

/// How a finished request is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Completed,
    Rejected,
    Failed,
}

impl Outcome {
    fn of(status: StatusCode) -> Self {
        if status.is_success() {
            Outcome::Completed
        } else if status.is_client_error() {
            Outcome::Rejected
        } else {
            Outcome::Failed
        }
    }
}

/// Request logging middleware
///
/// Logs all incoming requests with method, URI, status code, and
/// duration. Successful requests are logged at INFO level, rejected
/// uploads (4xx) at WARN, and converter or server failures at ERROR.
/// Attachments carry their size; the body itself is still streaming
/// when the line is written.
///
/// # Arguments
///
/// * `request` - The incoming HTTP request
/// * `next` - The next middleware or handler in the chain
///
/// # Returns
///
/// The response from the next handler, unchanged
pub async fn log_request(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let duration_ms = start.elapsed().as_millis();
    let status = response.status().as_u16();
    let size_bytes = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");

    match Outcome::of(response.status()) {
        Outcome::Completed => info!(
            method = %method,
            uri = %uri,
            status,
            size_bytes,
            duration_ms = %duration_ms,
            "Request completed"
        ),
        Outcome::Rejected => warn!(
            method = %method,
            uri = %uri,
            status,
            duration_ms = %duration_ms,
            "Request rejected"
        ),
        Outcome::Failed => error!(
            method = %method,
            uri = %uri,
            status,
            duration_ms = %duration_ms,
            "Request failed"
        ),
    }

    response
}
