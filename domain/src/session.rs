//! Per-request session state and the rules that decide it.

use oidc_auth::{decode_claims, Claims};
use serde::Serialize;

/// An access token this close to expiry is refreshed before use so it cannot
/// expire while a downstream call is in flight.
pub const EXPIRY_BUFFER_SECS: i64 = 60;

/// Where a de-authenticated browser is sent.
pub const LOGIN_PATH: &str = "/auth/login";

const AUTH_PREFIX: &str = "/auth";

/// The caller's identity as seen by handlers for one request.
///
/// Built once by the session middleware and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionContext {
    is_authenticated: bool,
    access_token: Option<String>,
    user: Option<SessionUser>,
}

/// Identity fields read from the access token's claims.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionUser {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl From<&Claims> for SessionUser {
    fn from(claims: &Claims) -> Self {
        SessionUser {
            id: claims.sub.clone(),
            email: claims.email.clone(),
            name: claims.name.clone(),
        }
    }
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(access_token: String, user: Option<SessionUser>) -> Self {
        SessionContext {
            is_authenticated: true,
            access_token: Some(access_token),
            user,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    /// The token to forward downstream, present only for authenticated sessions.
    pub fn bearer_token(&self) -> Option<&str> {
        if self.is_authenticated {
            self.access_token()
        } else {
            None
        }
    }
}

/// What the access-token cookie says about the session.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenStatus {
    /// Usable for at least another `EXPIRY_BUFFER_SECS`.
    Fresh(Claims),
    /// Expired or about to expire.
    Stale,
    /// Not a decodable token.
    Malformed,
}

pub fn token_status(access_token: &str, now_epoch_seconds: i64) -> TokenStatus {
    match decode_claims(access_token) {
        Ok(claims) if claims.seconds_until_expiry(now_epoch_seconds) >= EXPIRY_BUFFER_SECS => {
            TokenStatus::Fresh(claims)
        }
        Ok(_) => TokenStatus::Stale,
        Err(_) => TokenStatus::Malformed,
    }
}

/// Paths that are never redirected to login when a session is torn down: the
/// landing page and the auth flow routes themselves.
pub fn is_redirect_exempt(path: &str) -> bool {
    path == "/" || path == AUTH_PREFIX || path.starts_with("/auth/")
}
