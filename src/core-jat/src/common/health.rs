use axum::http::StatusCode;

/// Liveness probe. Doesn't touch the database.
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "healthy")
}
