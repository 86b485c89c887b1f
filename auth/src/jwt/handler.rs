use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use serde::Deserialize;
use serde::Serialize;

use super::errors::JwtError;
use crate::keys::SigningKey;

/// JWT codec for signing and verifying tokens.
///
/// Uses HS256 (HMAC with SHA-256). Verification covers the signature and
/// token structure only; expiration is judged by the caller against its own
/// clock so that expiry is testable and consistent across operations.
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
}

impl JwtHandler {
    /// Create a new JWT handler from a signing key.
    ///
    /// # Arguments
    /// * `key` - Shared secret used for both signing and verification
    ///
    /// # Returns
    /// JwtHandler instance configured with HS256 algorithm
    pub fn new(key: &SigningKey) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(key.as_bytes()),
            decoding_key: DecodingKey::from_secret(key.as_bytes()),
            algorithm: Algorithm::HS256,
        }
    }

    /// Encode claims into a compact JWT.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        let header = Header::new(self.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Verify the signature of a JWT and decode its claims.
    ///
    /// # Errors
    /// * `DecodingFailed` - Signature mismatch, wrong algorithm, malformed
    ///   token or claims that do not deserialize into `T`
    pub fn decode<T: for<'de> Deserialize<'de>>(&self, token: &str) -> Result<T, JwtError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        let token_data = decode::<T>(token, &self.decoding_key, &validation)
            .map_err(|e| JwtError::DecodingFailed(e.to_string()))?;

        Ok(token_data.claims)
    }
}
