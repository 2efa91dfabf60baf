//! The identity provider seam the web layer depends on.

use async_trait::async_trait;
use url::Url;

use crate::error::Error;
use crate::token::TokenPair;

/// Extra `prompt` values sent with the authorization request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// Ask the provider to show its account creation form instead of the login form.
    Create,
}

impl Prompt {
    pub fn as_str(&self) -> &'static str {
        match self {
            Prompt::Create => "create",
        }
    }
}

/// Inputs for the authorization redirect.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizationParams<'a> {
    pub redirect_uri: &'a str,
    pub state: &'a str,
    pub code_verifier: &'a str,
    pub prompt: Option<Prompt>,
}

/// Inputs for the authorization code grant.
#[derive(Debug, Clone, Copy)]
pub struct CodeExchange<'a> {
    /// The full callback URL, query string included.
    pub callback_url: &'a Url,
    /// When set, the callback's `state` must equal it before any grant is attempted.
    pub expected_state: Option<&'a str>,
    /// Sent as `code_verifier` when the flow used PKCE.
    pub code_verifier: Option<&'a str>,
    pub redirect_uri: &'a str,
}

/// OIDC operations against a single identity provider realm and client.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Build the authorization endpoint URL the browser is redirected to.
    async fn authorization_url(&self, params: AuthorizationParams<'_>) -> Result<Url, Error>;

    /// Exchange an authorization code for tokens. Fails on a state mismatch, a
    /// rejected grant, or a response without an ID token.
    async fn exchange_code(&self, exchange: CodeExchange<'_>) -> Result<TokenPair, Error>;

    /// Run the refresh token grant.
    async fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenPair, Error>;

    /// The end-session URL that logs the browser out of the provider.
    fn end_session_url(&self, id_token_hint: Option<&str>, post_logout_redirect_uri: &str) -> Url;
}
