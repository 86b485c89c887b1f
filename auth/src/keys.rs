use std::env;
use std::fmt;

use crate::errors::TokenError;

/// Shared HMAC secret used to sign and verify tokens.
#[derive(Clone)]
pub struct SigningKey(Vec<u8>);

impl SigningKey {
    /// Wrap a secret.
    ///
    /// # Errors
    /// * `Configuration` - Secret is empty
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, TokenError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(TokenError::Configuration(
                "Signing key must not be empty".to_string(),
            ));
        }
        Ok(Self(secret.to_vec()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SigningKey").field(&"<redacted>").finish()
    }
}

/// Source of the signing secret.
///
/// Read once when the token service is constructed; a failure there is a
/// startup error, never a per-request one.
pub trait SigningKeyProvider {
    /// Supply the signing key.
    ///
    /// # Errors
    /// * `Configuration` - Secret is missing, unreadable or empty
    fn signing_key(&self) -> Result<SigningKey, TokenError>;
}

/// Provider holding an explicit secret.
#[derive(Clone)]
pub struct StaticKeyProvider {
    secret: String,
}

impl StaticKeyProvider {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

impl SigningKeyProvider for StaticKeyProvider {
    fn signing_key(&self) -> Result<SigningKey, TokenError> {
        SigningKey::new(&self.secret)
    }
}

/// Provider reading the secret from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvKeyProvider {
    variable: String,
}

impl EnvKeyProvider {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }
}

impl SigningKeyProvider for EnvKeyProvider {
    fn signing_key(&self) -> Result<SigningKey, TokenError> {
        let secret = env::var(&self.variable).map_err(|e| {
            TokenError::Configuration(format!("Cannot read {}: {}", self.variable, e))
        })?;
        SigningKey::new(secret)
    }
}
