use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

/// Middleware that logs each route access with its result.
///
/// The route template (e.g. `/api/v1/job-applications/{id}`) is logged when one matched.
/// 4xx responses log at warn and 5xx at error.
pub async fn log_route_access(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| path.clone());
    let start = Instant::now();

    // Call the actual route handler
    let response = next.run(request).await;

    let duration_ms = start.elapsed().as_millis() as u64;
    let status = response.status().as_u16();

    match status {
        400..=499 => tracing::warn!(%method, %path, %route, status, duration_ms, "request rejected"),
        500..=599 => tracing::error!(%method, %path, %route, status, duration_ms, "request failed"),
        _ => tracing::info!(%method, %path, %route, status, duration_ms, "request served"),
    }

    response
}
