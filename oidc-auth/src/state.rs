//! CSRF state for one authorization attempt.

use rand::Rng;

use crate::pkce::PkceVerifier;

/// The pair of secrets created when a login or registration flow begins.
///
/// Both values travel to the browser in short-lived cookies and come back to the
/// callback, which consumes them exactly once.
#[derive(Debug, Clone)]
pub struct AuthorizationAttempt {
    pub state: String,
    pub code_verifier: PkceVerifier,
}

impl AuthorizationAttempt {
    pub fn new() -> Self {
        Self {
            state: generate_state(),
            code_verifier: PkceVerifier::generate(),
        }
    }
}

impl Default for AuthorizationAttempt {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate a cryptographically random state token (32 bytes, hex encoded).
pub fn generate_state() -> String {
    let random_bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(random_bytes)
}
