//! Token claims decoding and the token set returned by the identity provider.
//!
//! Signatures are not verified here. Tokens reach this code only from our own
//! httpOnly cookies or straight from the provider's token endpoint, never from
//! client-supplied input.

use base64::alphabet::URL_SAFE;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::{token_error, Error, TokenErrorKind};

// JWT segments are unpadded base64url, but some issuers pad them anyway.
const SEGMENT_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// The subset of a token's claims this application reads.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Claims {
    /// Subject: the identity provider's stable user id.
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    /// Expiry as seconds since the Unix epoch.
    pub exp: i64,
}

impl Claims {
    /// Seconds left before expiry; negative once expired.
    pub fn seconds_until_expiry(&self, now_epoch_seconds: i64) -> i64 {
        self.exp - now_epoch_seconds
    }
}

/// Decode the claims of a compact-serialized JWT without verifying it.
pub fn decode_claims(token: &str) -> Result<Claims, Error> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 || segments[1].is_empty() {
        return Err(token_error(
            TokenErrorKind::MissingSegment,
            &format!("expected 3 segments, found {}", segments.len()),
        ));
    }

    let payload = SEGMENT_ENGINE.decode(segments[1]).map_err(|e| Error {
        source: Some(Box::new(e)),
        error_kind: crate::ErrorKind::Token(TokenErrorKind::InvalidEncoding),
    })?;

    serde_json::from_slice(&payload).map_err(|e| Error {
        source: Some(Box::new(e)),
        error_kind: crate::ErrorKind::Token(TokenErrorKind::InvalidPayload),
    })
}

/// Tokens issued by a code exchange or a refresh.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: SecretString,
    /// Absent when the provider chose not to rotate it on refresh.
    pub refresh_token: Option<SecretString>,
    pub id_token: Option<SecretString>,
    /// Access token lifetime reported by the provider.
    pub expires_in: Option<u64>,
}

impl TokenPair {
    pub fn access_token(&self) -> &str {
        self.access_token.expose_secret()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_ref().map(|t| t.expose_secret().as_str())
    }

    pub fn id_token(&self) -> Option<&str> {
        self.id_token.as_ref().map(|t| t.expose_secret().as_str())
    }
}

/// Token endpoint response body (RFC 6749 §5.1 plus the OIDC `id_token`).
#[derive(Deserialize)]
pub(crate) struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

impl From<TokenResponse> for TokenPair {
    fn from(response: TokenResponse) -> Self {
        TokenPair {
            access_token: SecretString::new(response.access_token),
            refresh_token: response.refresh_token.map(SecretString::new),
            id_token: response.id_token.map(SecretString::new),
            expires_in: response.expires_in,
        }
    }
}
