use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::Router;
use domain::gateway::{Service, ServiceClient};
use log::*;
use oidc_auth::IdentityProvider;
use service::config::Config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

mod controller;
mod cookies;
mod error;
mod extractors;
mod middleware;
pub mod router;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{Error, Result, WebErrorKind};

/// Shared, read-only state handed to every handler and to the session middleware.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub identity_provider: Arc<dyn IdentityProvider>,
    pub parking_service: ServiceClient,
    pub reservation_service: ServiceClient,
    pub user_service: ServiceClient,
}

impl AppState {
    /// Builds the downstream clients from `config`, all sharing one HTTP client.
    pub fn new(
        config: Config,
        identity_provider: Arc<dyn IdentityProvider>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            parking_service: ServiceClient::new(
                http.clone(),
                config.parking_service_url(),
                Service::Parking,
            ),
            reservation_service: ServiceClient::new(
                http.clone(),
                config.reservation_service_url(),
                Service::Reservation,
            ),
            user_service: ServiceClient::new(http, config.user_service_url(), Service::User),
            identity_provider,
            config,
        }
    }
}

pub fn app(app_state: AppState) -> Router {
    let cors_layer = cors_layer(&app_state.config);
    router::define_routes(app_state).layer(cors_layer)
}

pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let host = app_state
        .config
        .interface
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let server_url = format!("{host}:{}", app_state.config.port);

    info!("Server starting... listening for connections on http://{server_url}");

    let listener = TcpListener::bind(&server_url).await?;
    axum::serve(listener, app(app_state)).await
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {origin:?}: {e}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_credentials(true)
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_origin(origins)
}
