use log::{error, info};
use oidc_auth::{http::HttpClientBuilder, KeycloakProvider};
use service::{config::Config, logging::Logger};
use std::sync::Arc;
use std::time::Duration;
use web::AppState;

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config as &Config);

    info!(
        "Starting Parkora BFF [{}], downstream services: parking={} reservation={} user={}",
        config.runtime_env(),
        config.parking_service_url(),
        config.reservation_service_url(),
        config.user_service_url(),
    );

    let http = match HttpClientBuilder::new()
        .with_timeout(Duration::from_secs(config.http_timeout_secs))
        .build()
    {
        Ok(http) => http,
        Err(e) => {
            error!("Failed to build the outbound HTTP client: {e}");
            std::process::exit(1);
        }
    };

    let identity_provider = match KeycloakProvider::new(http.clone()) {
        Ok(provider) => Arc::new(provider),
        Err(e) => {
            error!("Failed to configure the identity provider: {e}");
            std::process::exit(1);
        }
    };

    let app_state = AppState::new(config, identity_provider, http);

    if let Err(e) = web::init_server(app_state).await {
        error!("Server stopped: {e}");
        std::process::exit(1);
    }
}
