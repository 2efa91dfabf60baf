use crate::controller::found;
use crate::cookies::{self, ID_TOKEN};
use crate::error::{Error, WebErrorKind};
use crate::extractors::RequestOrigin;
use crate::AppState;
use axum::extract::{rejection::QueryRejection, OriginalUri, Query, State};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use domain::error::{DomainErrorKind, ExternalErrorKind, IdentityErrorKind};
use domain::user;
use log::*;
use oidc_auth::{AuthorizationAttempt, AuthorizationParams, CodeExchange, Prompt, TokenPair};
use serde::Deserialize;
use url::Url;

const CALLBACK_PATH: &str = "/auth/callback";

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

impl CallbackParams {
    /// Drops parameters that arrived with an empty value.
    fn non_empty(self) -> Self {
        let present = |value: Option<String>| value.filter(|v| !v.is_empty());
        Self {
            code: present(self.code),
            state: present(self.state),
            error: present(self.error),
            error_description: present(self.error_description),
        }
    }
}

pub(crate) fn callback_uri(origin: &str) -> String {
    format!("{origin}{CALLBACK_PATH}")
}

/// GET starts a login: stores a fresh state/verifier pair and redirects to the
/// identity provider.
pub(crate) async fn login(
    State(app_state): State<AppState>,
    RequestOrigin(origin): RequestOrigin,
    jar: CookieJar,
) -> Result<(CookieJar, Response), Error> {
    begin_authorization(&app_state, &origin, jar, None).await
}

pub(crate) async fn begin_authorization(
    app_state: &AppState,
    origin: &str,
    jar: CookieJar,
    prompt: Option<Prompt>,
) -> Result<(CookieJar, Response), Error> {
    let attempt = AuthorizationAttempt::new();
    let redirect_uri = callback_uri(origin);

    let authorization_url = app_state
        .identity_provider
        .authorization_url(AuthorizationParams {
            redirect_uri: &redirect_uri,
            state: &attempt.state,
            code_verifier: attempt.code_verifier.as_str(),
            prompt,
        })
        .await
        .map_err(|e| {
            error!("Could not build the authorization URL: {e}");
            Error::from(e)
        })?;

    debug!("Starting authorization (prompt: {prompt:?})");
    Ok((
        cookies::store_attempt(jar, &attempt),
        found(authorization_url.as_str()),
    ))
}

/// GET completes the authorization code flow.
///
/// The stored attempt cookies are removed whatever the outcome.
pub(crate) async fn callback(
    State(app_state): State<AppState>,
    RequestOrigin(origin): RequestOrigin,
    OriginalUri(uri): OriginalUri,
    params: Result<Query<CallbackParams>, QueryRejection>,
    jar: CookieJar,
) -> Response {
    let (jar, stored_state, code_verifier) = cookies::take_attempt(jar);

    let params = match params {
        Ok(Query(params)) => params.non_empty(),
        Err(rejection) => {
            warn!("Unreadable callback query: {rejection}");
            return (jar, Error::input("Invalid callback parameters")).into_response();
        }
    };

    let tokens = match exchange(
        &app_state,
        &origin,
        &uri,
        params,
        stored_state.as_deref(),
        code_verifier.as_deref(),
    )
    .await
    {
        Ok(tokens) => tokens,
        Err(e) => return (jar, e).into_response(),
    };

    if let Some(id_token) = tokens.id_token() {
        match user::ensure_exists(&app_state.user_service, id_token, tokens.access_token()).await {
            Ok(provisioning) => debug!("User directory entry: {provisioning:?}"),
            Err(e) => warn!("Could not provision user after login: {e}"),
        }
    }

    (cookies::store_tokens(jar, &tokens), found("/")).into_response()
}

async fn exchange(
    app_state: &AppState,
    origin: &str,
    uri: &axum::http::Uri,
    params: CallbackParams,
    stored_state: Option<&str>,
    code_verifier: Option<&str>,
) -> Result<TokenPair, Error> {
    if params.error.is_some() {
        let description = params
            .error_description
            .unwrap_or_else(|| "Authentication failed".to_string());
        warn!("Identity provider returned an error: {description}");
        return Err(Error::input(&description));
    }

    if params.code.is_none() {
        return Err(Error::input("Missing code parameter"));
    }

    // A registration flow may come back without `state`; only compare when both exist.
    let expected_state = match (stored_state, params.state.as_deref()) {
        (Some(stored), Some(returned)) if stored != returned => {
            warn!("Callback state does not match the stored state");
            return Err(Error::input("Invalid state parameter"));
        }
        (Some(stored), Some(_)) => Some(stored),
        _ => None,
    };

    let callback_url = Url::parse(&format!("{origin}{uri}")).map_err(|e| {
        warn!("Could not rebuild callback URL: {e}");
        Error::input("Invalid callback URL")
    })?;
    let redirect_uri = callback_uri(origin);

    app_state
        .identity_provider
        .exchange_code(CodeExchange {
            callback_url: &callback_url,
            expected_state,
            code_verifier,
            redirect_uri: &redirect_uri,
        })
        .await
        .map_err(|e| {
            let e = domain::error::Error::from(e);
            if matches!(
                e.error_kind,
                DomainErrorKind::External(ExternalErrorKind::Identity(
                    IdentityErrorKind::InvalidState
                ))
            ) {
                return Error::Domain(e);
            }
            error!("Token exchange error: {e}");
            Error::Web(WebErrorKind::TokenExchange)
        })
}

/// GET clears the session cookies and logs the browser out of the identity provider.
pub(crate) async fn logout(
    State(app_state): State<AppState>,
    RequestOrigin(origin): RequestOrigin,
    jar: CookieJar,
) -> (CookieJar, Response) {
    let id_token = cookies::value(&jar, ID_TOKEN);
    let end_session_url = app_state
        .identity_provider
        .end_session_url(id_token.as_deref(), &origin);

    info!("Logging out (id token hint present: {})", id_token.is_some());
    (cookies::clear_auth_cookies(jar), found(end_session_url.as_str()))
}

#[cfg(test)]
mod tests {
    use crate::router::define_routes;
    use crate::test_support::{
        cookie_value, last_set_cookie, set_cookies, test_state, token_expiring_in,
        FakeIdentityProvider,
    };
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        Router,
    };
    use mockito::Matcher;
    use std::sync::Arc;
    use tower::ServiceExt;
    use url::Url;

    fn app(provider: Arc<FakeIdentityProvider>, user_service_url: &str) -> Router {
        define_routes(test_state(provider, user_service_url))
    }

    fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_login_sets_attempt_cookies_and_redirects_to_provider() {
        let provider = Arc::new(FakeIdentityProvider::default());

        let response = app(provider.clone(), "http://unused")
            .oneshot(get("/auth/login", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        let location = Url::parse(response.headers()[header::LOCATION].to_str().unwrap()).unwrap();
        let state = cookie_value(&response, "oauth_state").unwrap();
        let verifier = cookie_value(&response, "code_verifier").unwrap();

        assert!(location
            .query_pairs()
            .any(|(k, v)| k == "state" && v == state.as_str()));
        let authorization = provider.authorizations().pop().unwrap();
        assert_eq!(authorization.redirect_uri, "https://app.parkora.test/auth/callback");
        assert_eq!(authorization.code_verifier, verifier);
        assert_eq!(authorization.prompt, None);
    }

    #[tokio::test]
    async fn test_login_fails_with_500_when_provider_is_unreachable() {
        let provider = Arc::new(FakeIdentityProvider::unreachable());

        let response = app(provider, "http://unused")
            .oneshot(get("/auth/login", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(set_cookies(&response).is_empty());
    }

    #[tokio::test]
    async fn test_login_then_callback_round_trip() {
        let mut user_service = mockito::Server::new_async().await;
        user_service
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body(r#"{"data":{"userByKeycloakId":{"id":"1"}}}"#)
            .create_async()
            .await;

        let access_token = token_expiring_in(300);
        let id_token = token_expiring_in(300);
        let provider = Arc::new(FakeIdentityProvider::issuing(
            &access_token,
            Some("rt"),
            Some(&id_token),
        ));
        let app = app(provider.clone(), &user_service.url());

        let login = app.clone().oneshot(get("/auth/login", None)).await.unwrap();
        let state = cookie_value(&login, "oauth_state").unwrap();
        let verifier = cookie_value(&login, "code_verifier").unwrap();

        let callback = app
            .oneshot(get(
                &format!("/auth/callback?code=abc&state={state}"),
                Some(&format!("oauth_state={state}; code_verifier={verifier}")),
            ))
            .await
            .unwrap();

        assert_eq!(callback.status(), StatusCode::FOUND);
        assert_eq!(callback.headers()[header::LOCATION], "/");
        assert_eq!(cookie_value(&callback, "access_token"), Some(access_token));
        assert_eq!(cookie_value(&callback, "refresh_token"), Some("rt".to_string()));
        assert_eq!(cookie_value(&callback, "id_token"), Some(id_token));
        let set = set_cookies(&callback);
        assert!(set.iter().any(|c| c.starts_with("oauth_state=;")));
        assert!(set.iter().any(|c| c.starts_with("code_verifier=;")));

        let exchange = provider.exchanges().pop().unwrap();
        assert_eq!(exchange.expected_state.as_deref(), Some(state.as_str()));
        assert_eq!(exchange.code_verifier.as_deref(), Some(verifier.as_str()));
        assert_eq!(exchange.redirect_uri, "https://app.parkora.test/auth/callback");
        assert!(exchange.callback_url.contains("code=abc"));
    }

    #[tokio::test]
    async fn test_state_mismatch_is_rejected_without_exchange() {
        let provider = Arc::new(FakeIdentityProvider::issuing("at", None, Some("it")));

        let response = app(provider.clone(), "http://unused")
            .oneshot(get(
                "/auth/callback?code=abc&state=attacker",
                Some("oauth_state=mine; code_verifier=v"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(provider.exchanges().is_empty());
        assert!(set_cookies(&response)
            .iter()
            .any(|c| c.starts_with("oauth_state=;")));
        assert_eq!(
            body_json(response).await["error"],
            "Invalid state parameter"
        );
    }

    #[tokio::test]
    async fn test_provider_error_and_missing_code_are_client_errors() {
        let provider = Arc::new(FakeIdentityProvider::default());

        let response = app(provider.clone(), "http://unused")
            .oneshot(get(
                "/auth/callback?error=access_denied&error_description=User%20cancelled",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "User cancelled");

        let response = app(provider.clone(), "http://unused")
            .oneshot(get("/auth/callback?error=access_denied", None))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["error"], "Authentication failed");

        let response = app(provider.clone(), "http://unused")
            .oneshot(get("/auth/callback?state=s", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Missing code parameter");
        assert!(provider.exchanges().is_empty());
    }

    #[tokio::test]
    async fn test_registration_callback_without_state_uses_plain_exchange() {
        let provider = Arc::new(FakeIdentityProvider::issuing("at", None, None));

        let response = app(provider.clone(), "http://unused")
            .oneshot(get("/auth/callback?code=abc", Some("oauth_state=s")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        let exchange = provider.exchanges().pop().unwrap();
        assert_eq!(exchange.expected_state, None);
        assert_eq!(exchange.code_verifier, None);
    }

    #[tokio::test]
    async fn test_failed_exchange_is_a_server_error() {
        let provider = Arc::new(FakeIdentityProvider::default());

        let response = app(provider.clone(), "http://unused")
            .oneshot(get("/auth/callback?code=abc&state=s", Some("oauth_state=s")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await["error"],
            "Failed to exchange authorization code"
        );
        assert_eq!(provider.exchanges().len(), 1);
    }

    #[tokio::test]
    async fn test_provisioning_failure_does_not_fail_callback() {
        let mut user_service = mockito::Server::new_async().await;
        let calls = user_service
            .mock("POST", "/graphql")
            .match_header("authorization", Matcher::Regex("^Bearer ".into()))
            .with_status(500)
            .expect(2)
            .create_async()
            .await;

        let id_token = token_expiring_in(300);
        let provider = Arc::new(FakeIdentityProvider::issuing("at", None, Some(&id_token)));

        let response = app(provider, &user_service.url())
            .oneshot(get("/auth/callback?code=abc", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/");
        calls.assert_async().await;
    }

    #[tokio::test]
    async fn test_logout_clears_cookies_and_redirects_to_end_session() {
        let provider = Arc::new(FakeIdentityProvider::default());
        let cookie = format!(
            "access_token={}; refresh_token=rt; id_token=the-id-token",
            token_expiring_in(600)
        );

        let response = app(provider, "http://unused")
            .oneshot(get("/auth/logout", Some(&cookie)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        let location = Url::parse(response.headers()[header::LOCATION].to_str().unwrap()).unwrap();
        let query: Vec<(String, String)> = location.query_pairs().into_owned().collect();
        assert!(query.contains(&("id_token_hint".into(), "the-id-token".into())));
        assert!(query.contains(&(
            "post_logout_redirect_uri".into(),
            "https://app.parkora.test".into()
        )));

        let set = set_cookies(&response);
        for name in ["access_token=;", "refresh_token=;", "id_token=;"] {
            assert!(set.iter().any(|c| c.starts_with(name)), "{name} not cleared");
        }
    }

    #[tokio::test]
    async fn test_logout_without_cookies_still_redirects() {
        let response = app(Arc::new(FakeIdentityProvider::default()), "http://unused")
            .oneshot(get("/auth/logout", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert!(set_cookies(&response).is_empty());
    }

    #[tokio::test]
    async fn test_logout_near_expiry_is_not_undone_by_session_refresh() {
        let provider = Arc::new(FakeIdentityProvider::issuing(
            &token_expiring_in(300),
            Some("rt-2"),
            None,
        ));
        let cookie = format!(
            "access_token={}; refresh_token=rt-1; id_token=it",
            token_expiring_in(30)
        );

        let response = app(provider, "http://unused")
            .oneshot(get("/auth/logout", Some(&cookie)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        for name in ["access_token", "refresh_token", "id_token"] {
            let last = last_set_cookie(&response, name).unwrap();
            assert!(last.starts_with(&format!("{name}=;")), "{name} survives logout: {last}");
        }
        assert!(!set_cookies(&response).iter().any(|c| c.contains("rt-2")));
    }

    #[tokio::test]
    async fn test_callback_tokens_survive_malformed_session_cookie() {
        let access_token = token_expiring_in(300);
        let provider = Arc::new(FakeIdentityProvider::issuing(&access_token, Some("rt"), None));

        let response = app(provider, "http://unused")
            .oneshot(get(
                "/auth/callback?code=abc",
                Some("access_token=garbage; refresh_token=old"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert!(last_set_cookie(&response, "access_token")
            .unwrap()
            .starts_with(&format!("access_token={access_token};")));
        assert!(last_set_cookie(&response, "refresh_token")
            .unwrap()
            .starts_with("refresh_token=rt;"));
    }

    #[tokio::test]
    async fn test_callback_tokens_win_over_refreshed_session() {
        let access_token = token_expiring_in(300);
        let provider = Arc::new(FakeIdentityProvider::issuing(&access_token, Some("rt-new"), None));
        let cookie = format!("access_token={}; refresh_token=rt-old", token_expiring_in(10));

        let response = app(provider, "http://unused")
            .oneshot(get("/auth/callback?code=abc", Some(&cookie)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        let access_cookies: Vec<String> = set_cookies(&response)
            .into_iter()
            .filter(|c| c.starts_with("access_token="))
            .collect();
        assert_eq!(access_cookies.len(), 1);
        assert!(access_cookies[0].starts_with(&format!("access_token={access_token};")));
    }

    #[tokio::test]
    async fn test_empty_callback_parameters_count_as_absent() {
        let provider = Arc::new(FakeIdentityProvider::issuing("at", None, None));

        let response = app(provider.clone(), "http://unused")
            .oneshot(get("/auth/callback?code=&state=s", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Missing code parameter");
        assert!(provider.exchanges().is_empty());

        let response = app(provider.clone(), "http://unused")
            .oneshot(get("/auth/callback?error=&code=abc", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(provider.exchanges().len(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_callback_query_still_discards_attempt() {
        let provider = Arc::new(FakeIdentityProvider::issuing("at", None, None));

        let response = app(provider.clone(), "http://unused")
            .oneshot(get(
                "/auth/callback?code=a&code=b",
                Some("oauth_state=s; code_verifier=v"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(provider.exchanges().is_empty());
        let set = set_cookies(&response);
        assert!(set.iter().any(|c| c.starts_with("oauth_state=;")));
        assert!(set.iter().any(|c| c.starts_with("code_verifier=;")));
    }
}
