use axum::http::{header::LOCATION, StatusCode};
use axum::response::{IntoResponse, Response};

pub(crate) mod auth_controller;
pub(crate) mod health_check_controller;
pub(crate) mod parking_proxy_controller;
pub(crate) mod registration_controller;
pub(crate) mod reservation_proxy_controller;
pub(crate) mod user_proxy_controller;

/// A `302 Found` redirect. Every auth flow redirect uses this status.
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}
