//! # oidc-auth
//!
//! OpenID Connect client side of the Parkora backend-for-frontend:
//! - Discovery of the Keycloak realm's metadata, cached for the life of the process
//! - Authorization URL construction with PKCE (S256)
//! - Authorization code and refresh token grants
//! - Unverified decoding of token claims
//! - The shared outbound HTTP client
//!
//! The web layer only talks to the [`IdentityProvider`] trait, so the flows can be
//! exercised against a fake provider in tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use oidc_auth::{http::HttpClientBuilder, AuthorizationAttempt, KeycloakProvider};
//!
//! let http = HttpClientBuilder::new().build()?;
//! let provider = KeycloakProvider::new(http)?;
//! let attempt = AuthorizationAttempt::new();
//! ```

pub mod discovery;
pub mod error;
pub mod http;
pub mod keycloak;
pub mod pkce;
pub mod provider;
pub mod state;
pub mod token;

// Re-export commonly used types
pub use discovery::{Discovery, ProviderMetadata};
pub use error::{Error, ErrorKind};
pub use keycloak::KeycloakProvider;
pub use pkce::{generate_code_verifier, PkceChallenge, PkceVerifier};
pub use provider::{AuthorizationParams, CodeExchange, IdentityProvider, Prompt};
pub use state::{generate_state, AuthorizationAttempt};
pub use token::{decode_claims, Claims, TokenPair};
