use chrono::Duration;

use crate::errors::TokenError;

/// Validity windows for issued tokens.
///
/// Access tokens always expire strictly sooner than refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPolicy {
    access_validity: Duration,
    refresh_validity: Duration,
}

impl TokenPolicy {
    pub const DEFAULT_ACCESS_HOURS: i64 = 6;
    pub const DEFAULT_REFRESH_HOURS: i64 = 48;
    /// Longest accepted window, ten years.
    pub const MAX_VALIDITY_HOURS: i64 = 10 * 365 * 24;

    /// Create a policy from explicit windows.
    ///
    /// # Errors
    /// * `Configuration` - A window is not positive or longer than
    ///   `MAX_VALIDITY_HOURS`, or the access window is not shorter than the
    ///   refresh window
    pub fn new(access_validity: Duration, refresh_validity: Duration) -> Result<Self, TokenError> {
        if access_validity <= Duration::zero() || refresh_validity <= Duration::zero() {
            return Err(TokenError::Configuration(
                "Token validity windows must be positive".to_string(),
            ));
        }
        let max_validity = Duration::hours(Self::MAX_VALIDITY_HOURS);
        if access_validity > max_validity || refresh_validity > max_validity {
            return Err(TokenError::Configuration(format!(
                "Token validity windows must not exceed {} hours",
                Self::MAX_VALIDITY_HOURS
            )));
        }
        if access_validity >= refresh_validity {
            return Err(TokenError::Configuration(format!(
                "Access token window ({}s) must be shorter than refresh token window ({}s)",
                access_validity.num_seconds(),
                refresh_validity.num_seconds()
            )));
        }
        Ok(Self {
            access_validity,
            refresh_validity,
        })
    }

    /// Create a policy from whole hours.
    ///
    /// # Errors
    /// * `Configuration` - Hours out of range, or windows rejected by `new`
    pub fn from_hours(access_hours: i64, refresh_hours: i64) -> Result<Self, TokenError> {
        Self::new(hours(access_hours)?, hours(refresh_hours)?)
    }

    pub fn access_validity(&self) -> Duration {
        self.access_validity
    }

    pub fn refresh_validity(&self) -> Duration {
        self.refresh_validity
    }
}

fn hours(value: i64) -> Result<Duration, TokenError> {
    Duration::try_hours(value).ok_or_else(|| {
        TokenError::Configuration(format!("Token validity of {} hours is out of range", value))
    })
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            access_validity: Duration::hours(Self::DEFAULT_ACCESS_HOURS),
            refresh_validity: Duration::hours(Self::DEFAULT_REFRESH_HOURS),
        }
    }
}
