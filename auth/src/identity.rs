use std::fmt;
use std::str::FromStr;

use crate::errors::IdentityError;

/// Principal identity value type
///
/// Opaque non-empty string (typically an email address). Used as the
/// identity claim of every token and as the session store key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    /// Create a new identity.
    ///
    /// # Arguments
    /// * `identity` - Raw identity string
    ///
    /// # Errors
    /// * `Empty` - Identity is empty or whitespace only
    pub fn new(identity: String) -> Result<Self, IdentityError> {
        if identity.trim().is_empty() {
            return Err(IdentityError::Empty);
        }
        Ok(Self(identity))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Identity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}
