//! HTTP client for the parking, reservation and user services.
//!
//! Every call is reduced to one of three outcomes for the caller: a decoded JSON
//! body, an unreachable service, or a service that answered with something
//! unusable. Downstream error bodies are logged here and never returned.

use crate::error::{Error, ExternalErrorKind};
use log::*;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

/// Header carrying the multitenancy identifier.
pub const TENANT_HEADER: &str = "X-Tenant-ID";

/// The single tenant this deployment serves.
pub const DEFAULT_TENANT_ID: &str = "parkora";

const GRAPHQL_PATH: &str = "/graphql";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Parking,
    Reservation,
    User,
}

impl Service {
    pub fn name(&self) -> &'static str {
        match self {
            Service::Parking => "parking-service",
            Service::Reservation => "reservation-service",
            Service::User => "user-service",
        }
    }

    /// Client-facing message for a service that answered but failed.
    pub fn failure_message(&self) -> &'static str {
        match self {
            Service::Parking => "Failed to fetch parking data from parking-service",
            Service::Reservation => "Failed to query reservation-service",
            Service::User => "Failed to query user service",
        }
    }

    /// Client-facing message for a service that could not be reached.
    pub fn unreachable_message(&self) -> String {
        format!("Failed to connect to {}", self.name())
    }

    pub fn sends_tenant_header(&self) -> bool {
        matches!(self, Service::Reservation | Service::User)
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub struct ServiceClient {
    http: reqwest::Client,
    base_url: String,
    service: Service,
}

impl ServiceClient {
    pub fn new(http: reqwest::Client, base_url: &str, service: Service) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            service,
        }
    }

    /// POSTs a GraphQL document to the service's `/graphql` endpoint.
    pub async fn post_graphql(&self, body: &Value, bearer: Option<&str>) -> Result<Value, Error> {
        let request = self.request(Method::POST, GRAPHQL_PATH, bearer).json(body);
        self.send(request).await
    }

    /// GETs the service's `/graphql` endpoint, passing the caller's raw query string through.
    pub async fn get_graphql(
        &self,
        raw_query: Option<&str>,
        bearer: Option<&str>,
    ) -> Result<Value, Error> {
        let path = match raw_query {
            Some(query) if !query.is_empty() => format!("{GRAPHQL_PATH}?{query}"),
            _ => GRAPHQL_PATH.to_string(),
        };
        let request = self.request(Method::GET, &path, bearer);
        self.send(request).await
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        bearer: Option<&str>,
    ) -> Result<T, Error> {
        let request = self.request(Method::GET, path, bearer);
        self.send(request).await
    }

    fn request(&self, method: Method, path: &str, bearer: Option<&str>) -> RequestBuilder {
        let mut request = self
            .http
            .request(method, format!("{}{}", self.base_url, path));

        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        if self.service.sends_tenant_header() {
            request = request.header(TENANT_HEADER, DEFAULT_TENANT_ID);
        }
        request
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, Error> {
        let response = request.send().await.map_err(|e| {
            error!("Error connecting to {}: {:?}", self.service, e);
            Error::external(
                ExternalErrorKind::Unreachable(self.service),
                Some(Box::new(e)),
            )
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("{} returned {}: {}", self.service, status, body);
            return Err(Error::external(
                ExternalErrorKind::Rejected(self.service, status.as_u16()),
                None,
            ));
        }

        response.json::<T>().await.map_err(|e| {
            warn!("Failed to parse response from {}: {:?}", self.service, e);
            Error::external(
                ExternalErrorKind::InvalidResponse(self.service),
                Some(Box::new(e)),
            )
        })
    }
}
