//! Shared fixtures for router and handler tests.

use crate::AppState;
use async_trait::async_trait;
use axum::http::header::SET_COOKIE;
use axum::response::Response;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use oidc_auth::error::{discovery_error, oauth_error, DiscoveryErrorKind, OAuthErrorKind};
use oidc_auth::{AuthorizationParams, CodeExchange, Error, IdentityProvider, Prompt, TokenPair};
use secrecy::SecretString;
use service::config::Config;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use url::Url;

pub(crate) const PUBLIC_ORIGIN: &str = "https://app.parkora.test";

#[derive(Debug, Clone)]
pub(crate) struct RecordedAuthorization {
    pub redirect_uri: String,
    pub code_verifier: String,
    pub prompt: Option<Prompt>,
}

#[derive(Debug, Clone)]
pub(crate) struct RecordedExchange {
    pub callback_url: String,
    pub expected_state: Option<String>,
    pub code_verifier: Option<String>,
    pub redirect_uri: String,
}

/// An identity provider that records every call and answers from canned tokens.
///
/// Without tokens, exchange and refresh fail as if the provider rejected the grant.
#[derive(Default)]
pub(crate) struct FakeIdentityProvider {
    tokens: Option<TokenPair>,
    unreachable: bool,
    authorizations: Mutex<Vec<RecordedAuthorization>>,
    exchanges: Mutex<Vec<RecordedExchange>>,
    refreshes: Mutex<Vec<String>>,
}

impl FakeIdentityProvider {
    pub(crate) fn issuing(access_token: &str, refresh_token: Option<&str>, id_token: Option<&str>) -> Self {
        Self {
            tokens: Some(TokenPair {
                access_token: SecretString::new(access_token.to_string()),
                refresh_token: refresh_token.map(|t| SecretString::new(t.to_string())),
                id_token: id_token.map(|t| SecretString::new(t.to_string())),
                expires_in: Some(300),
            }),
            ..Self::default()
        }
    }

    pub(crate) fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    pub(crate) fn authorizations(&self) -> Vec<RecordedAuthorization> {
        self.authorizations.lock().unwrap().clone()
    }

    pub(crate) fn exchanges(&self) -> Vec<RecordedExchange> {
        self.exchanges.lock().unwrap().clone()
    }

    pub(crate) fn refreshes(&self) -> Vec<String> {
        self.refreshes.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn authorization_url(&self, params: AuthorizationParams<'_>) -> Result<Url, Error> {
        if self.unreachable {
            return Err(discovery_error(DiscoveryErrorKind::Unreachable, "offline"));
        }
        self.authorizations.lock().unwrap().push(RecordedAuthorization {
            redirect_uri: params.redirect_uri.to_string(),
            code_verifier: params.code_verifier.to_string(),
            prompt: params.prompt,
        });

        let mut url = Url::parse("https://idp.parkora.test/auth").unwrap();
        url.query_pairs_mut().append_pair("state", params.state);
        if let Some(prompt) = params.prompt {
            url.query_pairs_mut().append_pair("prompt", prompt.as_str());
        }
        Ok(url)
    }

    async fn exchange_code(&self, exchange: CodeExchange<'_>) -> Result<TokenPair, Error> {
        self.exchanges.lock().unwrap().push(RecordedExchange {
            callback_url: exchange.callback_url.to_string(),
            expected_state: exchange.expected_state.map(str::to_string),
            code_verifier: exchange.code_verifier.map(str::to_string),
            redirect_uri: exchange.redirect_uri.to_string(),
        });
        self.tokens
            .clone()
            .ok_or_else(|| oauth_error(OAuthErrorKind::TokenExchangeFailed, "rejected"))
    }

    async fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenPair, Error> {
        self.refreshes.lock().unwrap().push(refresh_token.to_string());
        self.tokens
            .clone()
            .ok_or_else(|| oauth_error(OAuthErrorKind::TokenRefreshFailed, "invalid_grant"))
    }

    fn end_session_url(&self, id_token_hint: Option<&str>, post_logout_redirect_uri: &str) -> Url {
        let mut url = Url::parse("https://idp.parkora.test/logout").unwrap();
        url.query_pairs_mut()
            .append_pair("post_logout_redirect_uri", post_logout_redirect_uri);
        if let Some(hint) = id_token_hint {
            url.query_pairs_mut().append_pair("id_token_hint", hint);
        }
        url
    }
}

/// App state whose three downstream services all point at `downstream_url`.
pub(crate) fn test_state(provider: Arc<FakeIdentityProvider>, downstream_url: &str) -> AppState {
    let config = Config::from_args(["parkora_bff"])
        .set_public_origin(PUBLIC_ORIGIN.to_string())
        .set_parking_service_url(downstream_url.to_string())
        .set_reservation_service_url(downstream_url.to_string())
        .set_user_service_url(downstream_url.to_string());

    AppState::new(config, provider, reqwest::Client::new())
}

/// An unsigned token for `kc-user` that expires `seconds` from now (negative for the past).
pub(crate) fn token_expiring_in(seconds: i64) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;
    let payload = format!(
        r#"{{"sub":"kc-user","email":"ana@parkora.si","name":"Ana Novak","exp":{}}}"#,
        now + seconds
    );
    format!(
        "{}.{}.sig",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256"}"#),
        URL_SAFE_NO_PAD.encode(payload)
    )
}

pub(crate) fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

/// The value a response sets for cookie `name`, ignoring removals.
pub(crate) fn cookie_value(response: &Response, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    set_cookies(response).into_iter().find_map(|cookie| {
        let value = cookie.strip_prefix(&prefix)?.split(';').next()?.to_string();
        (!value.is_empty()).then_some(value)
    })
}

/// The last `Set-Cookie` header for `name`, which is the one a browser keeps.
pub(crate) fn last_set_cookie(response: &Response, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    set_cookies(response)
        .into_iter()
        .filter(|cookie| cookie.starts_with(&prefix))
        .last()
}
