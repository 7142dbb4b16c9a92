use crate::core::{ClaimError, Identity};

use super::token::{generate_identity_token, verify_identity_token, Profile};

/// Turns a raw credential into a verified identity
pub trait IdentityProvider: Send + Sync {
    /// # Errors
    ///
    /// `Unauthenticated` when the credential is missing or invalid
    fn verify(&self, raw_credential: Option<&str>) -> Result<Identity, ClaimError>;
}

/// Identity provider backed by HMAC-signed tokens
#[derive(Clone)]
pub struct SignedTokenProvider {
    secret_key: String,
}

impl SignedTokenProvider {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
        }
    }

    /// Issue a token for `subject`
    pub fn issue(&self, subject: &str, profile: &Profile) -> Result<String, String> {
        generate_identity_token(subject, profile, &self.secret_key)
    }
}

impl IdentityProvider for SignedTokenProvider {
    fn verify(&self, raw_credential: Option<&str>) -> Result<Identity, ClaimError> {
        verify_identity_token(raw_credential, &self.secret_key)
            .map(|claims| claims.into_identity())
            .filter(Identity::is_authenticated)
            .ok_or(ClaimError::Unauthenticated)
    }
}
