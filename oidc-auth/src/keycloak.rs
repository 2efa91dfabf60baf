//! Keycloak realm client for the Parkora frontend.

use async_trait::async_trait;
use log::*;
use url::Url;

use crate::discovery::{Discovery, ProviderMetadata};
use crate::error::{
    discovery_error, oauth_error, DiscoveryErrorKind, Error, ErrorKind, OAuthErrorKind,
};
use crate::http::RetryPolicy;
use crate::pkce::{PkceVerifier, CHALLENGE_METHOD};
use crate::provider::{AuthorizationParams, CodeExchange, IdentityProvider};
use crate::token::{TokenPair, TokenResponse};

pub const KEYCLOAK_URL: &str = "https://keycloak.parkora.crn.si/auth";
pub const REALM: &str = "parkora";
pub const CLIENT_ID: &str = "frontend-app";

/// Scopes requested on every authorization request.
pub const SCOPE: &str = "openid profile email";

const END_SESSION_PATH: &str = "protocol/openid-connect/logout";

/// Public (secretless) client of a single Keycloak realm.
pub struct KeycloakProvider {
    discovery: Discovery,
    client_id: String,
    end_session_endpoint: Url,
    http: reqwest::Client,
}

impl KeycloakProvider {
    /// The production realm and client.
    pub fn new(http: reqwest::Client) -> Result<Self, Error> {
        let issuer = parse_issuer(&format!("{KEYCLOAK_URL}/realms/{REALM}"))?;
        Self::with_issuer(issuer, CLIENT_ID, http)
    }

    /// A client of an arbitrary realm issuer, e.g. `https://host/auth/realms/name`.
    pub fn with_issuer(issuer: Url, client_id: &str, http: reqwest::Client) -> Result<Self, Error> {
        let end_session_endpoint = parse_issuer(&format!(
            "{}/{END_SESSION_PATH}",
            issuer.as_str().trim_end_matches('/')
        ))?;

        Ok(Self {
            discovery: Discovery::new(issuer, http.clone()),
            client_id: client_id.to_string(),
            end_session_endpoint,
            http,
        })
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.discovery = self.discovery.with_retry_policy(retry_policy);
        self
    }

    pub fn discovery(&self) -> &Discovery {
        &self.discovery
    }

    async fn token_request(
        &self,
        form: &[(&str, &str)],
        failure: OAuthErrorKind,
    ) -> Result<TokenPair, Error> {
        let metadata = self.discovery.provider_config().await?;

        let response = self
            .http
            .post(&metadata.token_endpoint)
            .form(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            warn!("Token endpoint rejected the {failure:?} grant with {status}: {error_text}");
            return Err(oauth_error(
                failure,
                &format!("token endpoint returned {status}"),
            ));
        }

        let tokens: TokenResponse = response.json().await.map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: ErrorKind::OAuth(OAuthErrorKind::InvalidResponse),
        })?;

        Ok(tokens.into())
    }
}

#[async_trait]
impl IdentityProvider for KeycloakProvider {
    async fn authorization_url(&self, params: AuthorizationParams<'_>) -> Result<Url, Error> {
        let metadata = self.discovery.provider_config().await?;
        build_authorization_url(metadata, &self.client_id, params)
    }

    async fn exchange_code(&self, exchange: CodeExchange<'_>) -> Result<TokenPair, Error> {
        let callback = CallbackParams::from_url(exchange.callback_url);

        if let Some(provider_error) = callback.error {
            return Err(oauth_error(
                OAuthErrorKind::AuthorizationFailed,
                &provider_error,
            ));
        }

        if let Some(expected) = exchange.expected_state {
            if callback.state.as_deref() != Some(expected) {
                warn!("Callback state does not match the state issued for this attempt");
                return Err(oauth_error(
                    OAuthErrorKind::InvalidState,
                    "state parameter mismatch",
                ));
            }
        }

        let code = callback
            .code
            .ok_or_else(|| oauth_error(OAuthErrorKind::MissingCode, "callback has no code"))?;

        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("code", code.as_str()),
            ("redirect_uri", exchange.redirect_uri),
            ("client_id", self.client_id.as_str()),
        ];
        if let Some(code_verifier) = exchange.code_verifier {
            form.push(("code_verifier", code_verifier));
        }

        debug!(
            "Exchanging authorization code ({})",
            if exchange.code_verifier.is_some() {
                "PKCE"
            } else {
                "plain"
            }
        );
        let tokens = self
            .token_request(&form, OAuthErrorKind::TokenExchangeFailed)
            .await?;

        if tokens.id_token.is_none() {
            return Err(oauth_error(
                OAuthErrorKind::MissingIdToken,
                "token response has no id_token",
            ));
        }

        info!("Exchanged authorization code for tokens");
        Ok(tokens)
    }

    async fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenPair, Error> {
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
        ];

        let tokens = self
            .token_request(&form, OAuthErrorKind::TokenRefreshFailed)
            .await?;
        debug!(
            "Refreshed access token (refresh token rotated: {})",
            tokens.refresh_token.is_some()
        );
        Ok(tokens)
    }

    fn end_session_url(&self, id_token_hint: Option<&str>, post_logout_redirect_uri: &str) -> Url {
        let mut url = self.end_session_endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("post_logout_redirect_uri", post_logout_redirect_uri);
            match id_token_hint {
                Some(hint) => query.append_pair("id_token_hint", hint),
                // Keycloak needs to know the client to honour the redirect without a hint.
                None => query.append_pair("client_id", &self.client_id),
            };
        }
        url
    }
}

/// Build the authorization endpoint URL with a PKCE S256 challenge.
pub fn build_authorization_url(
    metadata: &ProviderMetadata,
    client_id: &str,
    params: AuthorizationParams<'_>,
) -> Result<Url, Error> {
    let mut url = Url::parse(&metadata.authorization_endpoint).map_err(|e| Error {
        source: Some(Box::new(e)),
        error_kind: ErrorKind::Discovery(DiscoveryErrorKind::InvalidDocument),
    })?;
    let challenge = PkceVerifier::from_string(params.code_verifier.to_string()).challenge();

    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("client_id", client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", params.redirect_uri)
            .append_pair("scope", SCOPE)
            .append_pair("state", params.state)
            .append_pair("code_challenge", challenge.as_str())
            .append_pair("code_challenge_method", CHALLENGE_METHOD);
        if let Some(prompt) = params.prompt {
            query.append_pair("prompt", prompt.as_str());
        }
    }

    Ok(url)
}

fn parse_issuer(raw: &str) -> Result<Url, Error> {
    Url::parse(raw).map_err(|e| {
        let mut err = discovery_error(DiscoveryErrorKind::InvalidIssuer, raw);
        err.source = Some(Box::new(e));
        err
    })
}

#[derive(Default)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

impl CallbackParams {
    fn from_url(url: &Url) -> Self {
        url.query_pairs()
            .fold(CallbackParams::default(), |mut params, (key, value)| {
                match key.as_ref() {
                    "code" => params.code = Some(value.into_owned()),
                    "state" => params.state = Some(value.into_owned()),
                    "error" => params.error = Some(value.into_owned()),
                    _ => {}
                }
                params
            })
    }
}
