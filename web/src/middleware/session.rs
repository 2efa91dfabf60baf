use crate::controller::found;
use crate::cookies::{self, ACCESS_TOKEN, REFRESH_TOKEN};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header::SET_COOKIE, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use domain::session::{
    is_redirect_exempt, token_status, SessionContext, SessionUser, TokenStatus, LOGIN_PATH,
};
use log::*;
use oidc_auth::{decode_claims, IdentityProvider};
use std::time::{SystemTime, UNIX_EPOCH};

enum Resolution {
    Active(SessionContext),
    /// The session ended during this request; its cookies are already cleared.
    Ended,
}

/// Resolves the caller's session from their cookies before any handler runs.
///
/// A fresh access token is accepted as is. A stale one is refreshed when a refresh
/// token is available; otherwise, or when the refresh fails, the session is torn
/// down and the browser is sent to log in again, unless it is already on an auth
/// route or the landing page. An unreadable access token silently degrades the
/// request to anonymous.
pub(crate) async fn resolve_session(
    State(app_state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let (jar, resolution) =
        resolve(app_state.identity_provider.as_ref(), jar, now_epoch_seconds()).await;

    let session = match resolution {
        Resolution::Active(session) => session,
        Resolution::Ended if is_redirect_exempt(request.uri().path()) => {
            SessionContext::anonymous()
        }
        Resolution::Ended => {
            debug!(
                "Session ended on {}, redirecting to {LOGIN_PATH}",
                request.uri().path()
            );
            return (jar, found(LOGIN_PATH)).into_response();
        }
    };

    request.extensions_mut().insert(session);
    let response = next.run(request).await;
    with_session_cookies(jar, response)
}

/// Puts the middleware's cookie changes ahead of the handler's. A cookie the
/// handler wrote itself (login storing new tokens, logout removing them) keeps
/// the handler's value and the middleware's write for that name is dropped.
fn with_session_cookies(jar: CookieJar, mut response: Response) -> Response {
    let session_cookies = jar.into_response();
    let headers = response.headers_mut();
    let handler_cookies: Vec<HeaderValue> = headers.get_all(SET_COOKIE).iter().cloned().collect();
    let handler_names: Vec<&str> = handler_cookies.iter().filter_map(cookie_name).collect();

    headers.remove(SET_COOKIE);
    for value in session_cookies.headers().get_all(SET_COOKIE) {
        if cookie_name(value).is_some_and(|name| !handler_names.contains(&name)) {
            headers.append(SET_COOKIE, value.clone());
        }
    }
    for value in &handler_cookies {
        headers.append(SET_COOKIE, value.clone());
    }
    response
}

fn cookie_name(set_cookie: &HeaderValue) -> Option<&str> {
    let (name, _) = set_cookie.to_str().ok()?.split_once('=')?;
    Some(name.trim())
}

async fn resolve(
    identity_provider: &dyn IdentityProvider,
    jar: CookieJar,
    now: i64,
) -> (CookieJar, Resolution) {
    let Some(access_token) = cookies::value(&jar, ACCESS_TOKEN) else {
        return (jar, Resolution::Active(SessionContext::anonymous()));
    };

    match token_status(&access_token, now) {
        TokenStatus::Fresh(claims) => {
            let user = SessionUser::from(&claims);
            (
                jar,
                Resolution::Active(SessionContext::authenticated(access_token, Some(user))),
            )
        }
        TokenStatus::Malformed => {
            warn!("Discarding unreadable access token cookie");
            (
                cookies::clear_auth_cookies(jar),
                Resolution::Active(SessionContext::anonymous()),
            )
        }
        TokenStatus::Stale => refresh(identity_provider, jar).await,
    }
}

async fn refresh(identity_provider: &dyn IdentityProvider, jar: CookieJar) -> (CookieJar, Resolution) {
    let Some(refresh_token) = cookies::value(&jar, REFRESH_TOKEN) else {
        debug!("Access token expired and no refresh token is present");
        return (cookies::clear_auth_cookies(jar), Resolution::Ended);
    };

    match identity_provider.refresh_tokens(&refresh_token).await {
        Ok(tokens) => {
            let user = decode_claims(tokens.access_token())
                .ok()
                .map(|claims| SessionUser::from(&claims));
            let session = SessionContext::authenticated(tokens.access_token().to_string(), user);
            debug!("Refreshed session tokens");
            (cookies::store_tokens(jar, &tokens), Resolution::Active(session))
        }
        Err(e) => {
            warn!("Token refresh failed, ending session: {e}");
            (cookies::clear_auth_cookies(jar), Resolution::Ended)
        }
    }
}

fn now_epoch_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or_default()
}
