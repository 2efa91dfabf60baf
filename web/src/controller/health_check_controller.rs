use axum::http::StatusCode;
use axum::response::IntoResponse;

/// GET liveness check; answers without touching any upstream.
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "healthy")
}
