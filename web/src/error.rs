use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use domain::error::{
    DomainErrorKind, Error as DomainError, ExternalErrorKind, IdentityErrorKind,
};

extern crate log;
use log::*;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Domain(DomainError),
    Web(WebErrorKind),
}

/// Failures detected by the web layer itself.
#[derive(Debug, PartialEq)]
pub enum WebErrorKind {
    Unauthenticated,
    /// Bad request input, carrying the message shown to the client.
    Input(String),
    TokenExchange,
}

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

impl Error {
    pub(crate) fn input(message: &str) -> Self {
        Error::Web(WebErrorKind::Input(message.to_string()))
    }

    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Error::Web(web_error_kind) => match web_error_kind {
                WebErrorKind::Unauthenticated => {
                    (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
                }
                WebErrorKind::Input(message) => (StatusCode::BAD_REQUEST, message.clone()),
                WebErrorKind::TokenExchange => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to exchange authorization code".to_string(),
                ),
            },
            Error::Domain(domain_error) => match &domain_error.error_kind {
                DomainErrorKind::Internal(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                ),
                DomainErrorKind::External(external_error_kind) => match external_error_kind {
                    ExternalErrorKind::Unreachable(service) => {
                        (StatusCode::SERVICE_UNAVAILABLE, service.unreachable_message())
                    }
                    ExternalErrorKind::Rejected(service, _)
                    | ExternalErrorKind::InvalidResponse(service) => {
                        (StatusCode::BAD_GATEWAY, service.failure_message().to_string())
                    }
                    ExternalErrorKind::Identity(identity_error_kind) => {
                        match identity_error_kind {
                            IdentityErrorKind::InvalidState => (
                                StatusCode::BAD_REQUEST,
                                "Invalid state parameter".to_string(),
                            ),
                            IdentityErrorKind::MissingCode => (
                                StatusCode::BAD_REQUEST,
                                "Missing code parameter".to_string(),
                            ),
                            IdentityErrorKind::AuthorizationDenied => (
                                StatusCode::BAD_REQUEST,
                                "Authentication failed".to_string(),
                            ),
                            IdentityErrorKind::TokenExchange => (
                                StatusCode::INTERNAL_SERVER_ERROR,
                                "Failed to exchange authorization code".to_string(),
                            ),
                            _ => (
                                StatusCode::INTERNAL_SERVER_ERROR,
                                "Failed to reach identity provider".to_string(),
                            ),
                        }
                    }
                },
            },
        }
    }
}

// Bodies are always a generic `{"error": ...}`; details stay in the server log.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            debug!("Responding {status}: {self}");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<DomainError> for Error {
    fn from(err: DomainError) -> Self {
        Error::Domain(err)
    }
}

impl From<oidc_auth::Error> for Error {
    fn from(err: oidc_auth::Error) -> Self {
        Error::Domain(err.into())
    }
}
