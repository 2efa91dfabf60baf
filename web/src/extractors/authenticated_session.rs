use crate::error::{Error, WebErrorKind};
use axum::{extract::FromRequestParts, http::request::Parts};
use domain::session::SessionContext;
use std::convert::Infallible;

/// The session the middleware resolved for this request. Anonymous when the
/// middleware did not run.
pub(crate) struct CurrentSession(pub SessionContext);

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentSession(session_of(parts)))
    }
}

fn session_of(parts: &Parts) -> SessionContext {
    parts
        .extensions
        .get::<SessionContext>()
        .cloned()
        .unwrap_or_default()
}

/// Like [`CurrentSession`], but rejects anonymous callers with a 401.
pub(crate) struct AuthenticatedSession {
    pub access_token: String,
}

impl<S> FromRequestParts<S> for AuthenticatedSession
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match session_of(parts).bearer_token() {
            Some(access_token) => Ok(AuthenticatedSession {
                access_token: access_token.to_string(),
            }),
            None => Err(Error::Web(WebErrorKind::Unauthenticated)),
        }
    }
}
