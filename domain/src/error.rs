//! Error types for the `domain` layer.
use crate::gateway::Service;
use oidc_auth::error::{
    DiscoveryErrorKind, Error as OidcError, ErrorKind as OidcErrorKind, OAuthErrorKind,
};
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure
/// with `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums that represent the kinds of errors that can occur in the domain layer or
/// in lower layers. The `source` field holds the original error. `web` depends on
/// `domain` but never directly on `oidc-auth` error kinds; it reads the translated
/// kinds below to pick status codes.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
}

#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    Config,
}

/// Failures of systems outside this process.
#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    Identity(IdentityErrorKind),
    /// The downstream service could not be reached at all.
    Unreachable(Service),
    /// The downstream service answered with a non-success status.
    Rejected(Service, u16),
    /// The downstream service answered with a body that could not be used.
    InvalidResponse(Service),
}

/// Identity provider failures, reduced to what callers act on.
#[derive(Debug, PartialEq)]
pub enum IdentityErrorKind {
    Discovery,
    InvalidState,
    MissingCode,
    AuthorizationDenied,
    TokenExchange,
    TokenRefresh,
    MalformedToken,
    Network,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Domain Error: {:?}", self.error_kind)?;
        if let Some(source) = &self.source {
            write!(f, " caused by: {source}")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl Error {
    pub(crate) fn external(kind: ExternalErrorKind, source: Option<Box<dyn StdError + Send + Sync>>) -> Self {
        Error {
            source,
            error_kind: DomainErrorKind::External(kind),
        }
    }
}

// This is where we translate errors from the `oidc-auth` layer to the `domain` layer.
impl From<OidcError> for Error {
    fn from(err: OidcError) -> Self {
        let identity_error_kind = match &err.error_kind {
            OidcErrorKind::Discovery(DiscoveryErrorKind::InvalidIssuer) => {
                return Error {
                    source: Some(Box::new(err)),
                    error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
                }
            }
            OidcErrorKind::Discovery(_) => IdentityErrorKind::Discovery,
            OidcErrorKind::OAuth(kind) => match kind {
                OAuthErrorKind::InvalidState => IdentityErrorKind::InvalidState,
                OAuthErrorKind::MissingCode => IdentityErrorKind::MissingCode,
                OAuthErrorKind::AuthorizationFailed => IdentityErrorKind::AuthorizationDenied,
                OAuthErrorKind::TokenRefreshFailed => IdentityErrorKind::TokenRefresh,
                OAuthErrorKind::TokenExchangeFailed
                | OAuthErrorKind::MissingIdToken
                | OAuthErrorKind::InvalidResponse => IdentityErrorKind::TokenExchange,
            },
            OidcErrorKind::Token(_) => IdentityErrorKind::MalformedToken,
            OidcErrorKind::Http(_) => IdentityErrorKind::Network,
        };

        Error::external(
            ExternalErrorKind::Identity(identity_error_kind),
            Some(Box::new(err)),
        )
    }
}
