//! The browser cookies that carry the session and the in-flight authorization attempt.
//!
//! Every cookie is `Path=/`, `HttpOnly`, `Secure` and `SameSite=Lax`. Cookies are only
//! ever written whole or removed whole.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use oidc_auth::{AuthorizationAttempt, TokenPair};
use time::Duration;

pub(crate) const ACCESS_TOKEN: &str = "access_token";
pub(crate) const REFRESH_TOKEN: &str = "refresh_token";
pub(crate) const ID_TOKEN: &str = "id_token";
pub(crate) const OAUTH_STATE: &str = "oauth_state";
pub(crate) const CODE_VERIFIER: &str = "code_verifier";

/// Used when the provider does not report `expires_in`.
const DEFAULT_ACCESS_TOKEN_LIFETIME: Duration = Duration::seconds(300);
const REFRESH_TOKEN_LIFETIME: Duration = Duration::days(7);
/// Fixed, independent of the token's own expiry; only logout reads it.
const ID_TOKEN_LIFETIME: Duration = Duration::hours(24);
const AUTHORIZATION_ATTEMPT_LIFETIME: Duration = Duration::minutes(10);

fn build_cookie(name: &'static str, value: &str, max_age: Duration) -> Cookie<'static> {
    Cookie::build((name, value.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}

pub(crate) fn value(jar: &CookieJar, name: &str) -> Option<String> {
    jar.get(name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

/// Writes the tokens the provider issued. Refresh and ID token cookies are only
/// overwritten when the provider returned a new value.
pub(crate) fn store_tokens(jar: CookieJar, tokens: &TokenPair) -> CookieJar {
    let access_lifetime = tokens
        .expires_in
        .and_then(|secs| i64::try_from(secs).ok())
        .map(Duration::seconds)
        .unwrap_or(DEFAULT_ACCESS_TOKEN_LIFETIME);

    let mut jar = jar.add(build_cookie(
        ACCESS_TOKEN,
        tokens.access_token(),
        access_lifetime,
    ));
    if let Some(refresh_token) = tokens.refresh_token() {
        jar = jar.add(build_cookie(
            REFRESH_TOKEN,
            refresh_token,
            REFRESH_TOKEN_LIFETIME,
        ));
    }
    if let Some(id_token) = tokens.id_token() {
        jar = jar.add(build_cookie(ID_TOKEN, id_token, ID_TOKEN_LIFETIME));
    }
    jar
}

/// Removes the access, refresh and ID token cookies. Removing a cookie the browser
/// did not send is a no-op.
pub(crate) fn clear_auth_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(removal_cookie(ACCESS_TOKEN))
        .remove(removal_cookie(REFRESH_TOKEN))
        .remove(removal_cookie(ID_TOKEN))
}

pub(crate) fn store_attempt(jar: CookieJar, attempt: &AuthorizationAttempt) -> CookieJar {
    jar.add(build_cookie(
        OAUTH_STATE,
        &attempt.state,
        AUTHORIZATION_ATTEMPT_LIFETIME,
    ))
    .add(build_cookie(
        CODE_VERIFIER,
        attempt.code_verifier.as_str(),
        AUTHORIZATION_ATTEMPT_LIFETIME,
    ))
}

/// The stored attempt, if any, as `(state, code_verifier)`, along with a jar that
/// removes both cookies so they cannot be used twice.
pub(crate) fn take_attempt(jar: CookieJar) -> (CookieJar, Option<String>, Option<String>) {
    let state = value(&jar, OAUTH_STATE);
    let code_verifier = value(&jar, CODE_VERIFIER);
    let jar = jar
        .remove(removal_cookie(OAUTH_STATE))
        .remove(removal_cookie(CODE_VERIFIER));
    (jar, state, code_verifier)
}
