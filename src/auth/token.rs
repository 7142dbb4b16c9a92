use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::core::{Identity, ANONYMOUS_NAME};

type HmacSha256 = Hmac<Sha256>;

pub const TOKEN_EXPIRY_SECONDS: u64 = 86400; // 24 hours

/// Optional profile fields carried alongside the subject
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

impl Profile {
    /// First non-blank of name, nickname, given name; otherwise "Anonymous"
    pub fn display_name(&self) -> String {
        [&self.name, &self.nickname, &self.given_name]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .unwrap_or(ANONYMOUS_NAME)
            .to_string()
    }
}

/// Signed token body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Stable subject id
    pub sub: String,
    #[serde(flatten)]
    pub profile: Profile,
    /// Unix expiry in seconds
    pub exp: u64,
}

impl IdentityClaims {
    pub fn into_identity(self) -> Identity {
        let display_name = self.profile.display_name();
        Identity {
            id: self.sub,
            display_name,
            avatar_uri: self.profile.picture,
        }
    }
}

fn now_secs() -> Result<u64, String> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| format!("System time error: {}", e))
}

/// Generate a signed identity token valid for 24 hours
///
/// # Arguments
///
/// * `subject` - Stable unique id of the user
/// * `profile` - Display data to embed
/// * `secret_key` - Secret key for signing
///
/// # Returns
///
/// Token string in format: `base64url(claims).base64url(signature)`
///
/// # Errors
///
/// Returns an error if HMAC initialization fails or time is invalid
pub fn generate_identity_token(
    subject: &str,
    profile: &Profile,
    secret_key: &str,
) -> Result<String, String> {
    let expiry = now_secs()? + TOKEN_EXPIRY_SECONDS;
    generate_identity_token_with_expiry(subject, profile, expiry, secret_key)
}

/// Generate a signed identity token with an explicit unix expiry
pub fn generate_identity_token_with_expiry(
    subject: &str,
    profile: &Profile,
    expiry: u64,
    secret_key: &str,
) -> Result<String, String> {
    let claims = IdentityClaims {
        sub: subject.to_string(),
        profile: profile.clone(),
        exp: expiry,
    };

    let json = serde_json::to_vec(&claims).map_err(|e| format!("Claims encoding error: {}", e))?;
    let payload = URL_SAFE_NO_PAD.encode(json);

    let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes())
        .map_err(|e| format!("HMAC initialization error: {}", e))?;
    mac.update(payload.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{}.{}", payload, signature))
}

/// Verify an identity token and extract its claims
///
/// Returns None for a missing, malformed, tampered or expired token.
/// The signature is checked in constant time before the payload is parsed.
pub fn verify_identity_token(token: Option<&str>, secret_key: &str) -> Option<IdentityClaims> {
    let token = token?;

    let (payload, signature_b64) = token.split_once('.')?;
    if signature_b64.contains('.') {
        return None;
    }

    let provided_signature = URL_SAFE_NO_PAD.decode(signature_b64).ok()?;
    let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes()).ok()?;
    mac.update(payload.as_bytes());
    mac.verify_slice(&provided_signature).ok()?;

    let json = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: IdentityClaims = serde_json::from_slice(&json).ok()?;

    if now_secs().ok()? > claims.exp {
        return None; // Token expired
    }

    Some(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str) -> Profile {
        Profile {
            name: Some(name.to_string()),
            ..Profile::default()
        }
    }

    #[test]
    fn test_generate_and_verify_valid_token() {
        let secret = "test_secret_key_12345";
        let token = generate_identity_token("user|123", &profile("Alice"), secret).unwrap();
        assert_eq!(token.matches('.').count(), 1);

        let claims = verify_identity_token(Some(&token), secret).unwrap();
        assert_eq!(claims.sub, "user|123");
        assert_eq!(claims.profile.name.as_deref(), Some("Alice"));
        assert!(claims.exp > 0);
    }

    #[test]
    fn test_verify_none_token() {
        assert!(verify_identity_token(None, "secret").is_none());
    }

    #[test]
    fn test_malformed_tokens() {
        let secret = "test_secret";
        assert!(verify_identity_token(Some(""), secret).is_none());
        assert!(verify_identity_token(Some("no-dot-here"), secret).is_none());
        assert!(verify_identity_token(Some("a.b.c"), secret).is_none());
        assert!(verify_identity_token(Some("!!!.???"), secret).is_none());
    }

    #[test]
    fn test_verify_token_with_wrong_secret() {
        let token = generate_identity_token("user|1", &profile("A"), "correct").unwrap();
        assert!(verify_identity_token(Some(&token), "wrong").is_none());
    }

    #[test]
    fn test_tampered_payload() {
        let secret = "test_secret";
        let token = generate_identity_token("user|1", &profile("A"), secret).unwrap();
        let (_, signature) = token.split_once('.').unwrap();

        let forged_claims = IdentityClaims {
            sub: "user|admin".to_string(),
            profile: profile("A"),
            exp: u64::MAX,
        };
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap());
        let forged = format!("{}.{}", forged_payload, signature);

        assert!(verify_identity_token(Some(&forged), secret).is_none());
    }

    #[test]
    fn test_expired_token_fails() {
        let secret = "test_secret";
        let token =
            generate_identity_token_with_expiry("user|1", &profile("A"), 1_000, secret).unwrap();
        assert!(verify_identity_token(Some(&token), secret).is_none());
    }

    #[test]
    fn test_display_name_fallback_order() {
        let full = Profile {
            name: Some("Full Name".to_string()),
            nickname: Some("nick".to_string()),
            given_name: Some("Given".to_string()),
            picture: None,
        };
        assert_eq!(full.display_name(), "Full Name");

        let nick = Profile {
            name: Some("   ".to_string()),
            nickname: Some("nick".to_string()),
            ..Profile::default()
        };
        assert_eq!(nick.display_name(), "nick");

        let given = Profile {
            given_name: Some("Given".to_string()),
            ..Profile::default()
        };
        assert_eq!(given.display_name(), "Given");

        assert_eq!(Profile::default().display_name(), "Anonymous");
    }

    #[test]
    fn test_claims_into_identity() {
        let claims = IdentityClaims {
            sub: "user|9".to_string(),
            profile: Profile {
                nickname: Some("niner".to_string()),
                picture: Some("https://img/9.png".to_string()),
                ..Profile::default()
            },
            exp: 0,
        };

        let identity = claims.into_identity();
        assert_eq!(identity.id, "user|9");
        assert_eq!(identity.display_name, "niner");
        assert_eq!(identity.avatar_uri.as_deref(), Some("https://img/9.png"));
    }
}
