use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{auth::Profile, core::ClaimError};

const MAX_NAME_CHARS: usize = 50;
const MAX_PICTURE_LEN: usize = 2048;

/// Parse one raw coordinate component
///
/// Accepts JSON integers, and floats with no fractional part (`2.0`).
/// Anything else (missing, `1.5`, strings, ...) is `InvalidCoordinate`.
pub fn parse_coordinate(name: &str, value: &Value) -> Result<i64, ClaimError> {
    let invalid = |why: &str| ClaimError::InvalidCoordinate(format!("{} {}", name, why));

    match value {
        Value::Null => Err(invalid("is missing")),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            match n.as_f64() {
                Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 => Ok(f as i64),
                _ => Err(invalid("must be an integer")),
            }
        }
        _ => Err(invalid("must be an integer")),
    }
}

/// Request to claim a block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimBlockRequest {
    #[serde(default)]
    pub row: Value,
    #[serde(default)]
    pub col: Value,
}

impl ClaimBlockRequest {
    /// Validated integer coordinates (bounds are checked by the grid)
    pub fn coordinates(&self) -> Result<(i64, i64), ClaimError> {
        Ok((
            parse_coordinate("row", &self.row)?,
            parse_coordinate("col", &self.col)?,
        ))
    }
}

/// Request to start a guest session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignInRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

impl SignInRequest {
    /// Validate and clean a name field
    ///
    /// Blank names become None. Names longer than 50 characters or containing
    /// control characters are rejected.
    pub fn validate_name(field: &str, value: Option<String>) -> Result<Option<String>, String> {
        let Some(value) = value else {
            return Ok(None);
        };

        let cleaned = value.trim();
        if cleaned.is_empty() {
            return Ok(None);
        }

        if cleaned.chars().count() > MAX_NAME_CHARS {
            return Err(format!(
                "{} must be {} characters or less",
                field, MAX_NAME_CHARS
            ));
        }

        if cleaned.chars().any(char::is_control) {
            return Err(format!("{} must not contain control characters", field));
        }

        Ok(Some(cleaned.to_string()))
    }

    /// Validate the avatar URI: absolute http(s), bounded length
    pub fn validate_picture(value: Option<String>) -> Result<Option<String>, String> {
        let Some(value) = value else {
            return Ok(None);
        };

        let cleaned = value.trim();
        if cleaned.is_empty() {
            return Ok(None);
        }

        if cleaned.len() > MAX_PICTURE_LEN {
            return Err("picture URI is too long".to_string());
        }

        if !(cleaned.starts_with("https://") || cleaned.starts_with("http://")) {
            return Err("picture must be an http(s) URI".to_string());
        }

        Ok(Some(cleaned.to_string()))
    }

    /// Validate every field and build the token profile
    pub fn into_profile(self) -> Result<Profile, String> {
        Ok(Profile {
            name: Self::validate_name("name", self.name)?,
            nickname: Self::validate_name("nickname", self.nickname)?,
            given_name: Self::validate_name("given_name", self.given_name)?,
            picture: Self::validate_picture(self.picture)?,
        })
    }
}

/// Messages a WebSocket client may send
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Claim {
        #[serde(default)]
        row: Value,
        #[serde(default)]
        col: Value,
    },
}
