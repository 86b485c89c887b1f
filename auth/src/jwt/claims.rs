use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use super::errors::JwtError;
use crate::identity::Identity;

/// Kind of credential carried in the `sub` claim.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TokenKind {
    #[serde(rename = "AccessToken")]
    Access,

    #[serde(rename = "RefreshToken")]
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "AccessToken",
            TokenKind::Refresh => "RefreshToken",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claim set of every issued token.
///
/// Identity travels in the `email` claim; the token kind in `sub`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Token kind (access or refresh)
    pub sub: TokenKind,

    /// Expiration time (Unix timestamp, seconds)
    pub exp: i64,

    /// Issued at (Unix timestamp, seconds)
    pub iat: i64,

    /// Unique token identifier, so tokens issued within the same second differ
    pub jti: String,

    /// Identity of the principal
    #[serde(rename = "email")]
    pub identity: String,
}

impl Claims {
    /// Build claims for `identity` valid for `validity` starting at `now`.
    ///
    /// # Arguments
    /// * `kind` - Access or refresh
    /// * `identity` - Principal the token is issued to
    /// * `now` - Issuance instant
    /// * `validity` - Window until expiration (must be positive)
    ///
    /// # Errors
    /// * `EncodingFailed` - Expiration falls outside the representable range
    pub fn issue(
        kind: TokenKind,
        identity: &Identity,
        now: DateTime<Utc>,
        validity: Duration,
    ) -> Result<Self, JwtError> {
        let expires_at = now.checked_add_signed(validity).ok_or_else(|| {
            JwtError::EncodingFailed("Token expiration is out of range".to_string())
        })?;

        Ok(Self {
            sub: kind,
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            identity: identity.as_str().to_string(),
        })
    }

    /// Whether the expiration lies strictly before `current_timestamp`.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp < current_timestamp
    }

    /// Expiration as a UTC instant.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}
