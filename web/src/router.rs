use crate::{middleware::session::resolve_session, AppState};
use axum::{middleware::from_fn_with_state, routing::get, Router};

use crate::controller::{
    auth_controller, health_check_controller, parking_proxy_controller, registration_controller,
    reservation_proxy_controller, user_proxy_controller,
};

/// Every route sits behind the session middleware, which resolves the caller's
/// session before any handler runs.
pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(auth_routes())
        .merge(proxy_routes())
        .layer(from_fn_with_state(app_state.clone(), resolve_session))
        .with_state(app_state)
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", get(auth_controller::login))
        .route("/auth/callback", get(auth_controller::callback))
        .route("/auth/logout", get(auth_controller::logout))
        .route("/register", get(registration_controller::register))
}

fn proxy_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/_internal/parking-proxy",
            get(parking_proxy_controller::availability).post(parking_proxy_controller::graphql),
        )
        .route(
            "/_internal/reservation-proxy",
            get(reservation_proxy_controller::query).post(reservation_proxy_controller::graphql),
        )
        .route(
            "/_internal/user-proxy",
            axum::routing::post(user_proxy_controller::graphql),
        )
}
