use thiserror::Error;

use crate::jwt::JwtError;
use crate::session::SessionStoreError;

/// Error for Identity validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Identity must not be empty")]
    Empty,
}

/// Top-level error for token service operations.
///
/// Verification failures of any cause collapse into `InvalidToken`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Invalid token")]
    InvalidToken,

    #[error("Missing {0} header")]
    MissingHeader(&'static str),

    #[error("Malformed {0} header")]
    MalformedHeader(&'static str),

    #[error("Session store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid identity: {0}")]
    InvalidIdentity(#[from] IdentityError),
}

impl TokenError {
    /// Whether the caller may retry the same operation.
    ///
    /// Only session store failures qualify; reissuance overwrites the
    /// session so a retry is idempotent.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TokenError::StoreUnavailable(_))
    }
}

impl From<JwtError> for TokenError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::EncodingFailed(reason) => TokenError::Configuration(reason),
            JwtError::DecodingFailed(_) => TokenError::InvalidToken,
        }
    }
}

impl From<SessionStoreError> for TokenError {
    fn from(err: SessionStoreError) -> Self {
        TokenError::StoreUnavailable(err.to_string())
    }
}
