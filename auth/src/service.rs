use std::sync::Arc;

use http::HeaderMap;

use crate::clock::Clock;
use crate::clock::SystemClock;
use crate::errors::TokenError;
use crate::identity::Identity;
use crate::jwt::Claims;
use crate::jwt::JwtHandler;
use crate::jwt::TokenKind;
use crate::keys::SigningKeyProvider;
use crate::policy::TokenPolicy;
use crate::request;
use crate::session::SessionStore;

/// Access and refresh token issued together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues, stores and verifies identity-bearing tokens.
///
/// Access tokens are stateless. Refresh tokens are additionally recorded in
/// the session store under their identity, one live session per identity.
pub struct TokenService<S>
where
    S: SessionStore,
{
    jwt_handler: JwtHandler,
    store: Arc<S>,
    policy: TokenPolicy,
    clock: Arc<dyn Clock>,
}

impl<S> TokenService<S>
where
    S: SessionStore,
{
    /// Create a new token service with injected dependencies.
    ///
    /// The signing key is read once, here.
    ///
    /// # Arguments
    /// * `key_provider` - Source of the signing secret
    /// * `store` - Session store for refresh tokens
    /// * `policy` - Validity windows
    ///
    /// # Errors
    /// * `Configuration` - Signing key missing, unreadable or empty
    pub fn new(
        key_provider: &dyn SigningKeyProvider,
        store: Arc<S>,
        policy: TokenPolicy,
    ) -> Result<Self, TokenError> {
        let key = key_provider.signing_key()?;

        Ok(Self {
            jwt_handler: JwtHandler::new(&key),
            store,
            policy,
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the clock used for issuance and expiry checks.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn policy(&self) -> &TokenPolicy {
        &self.policy
    }

    /// Issue a signed access token for `identity`.
    ///
    /// # Errors
    /// * `Configuration` - Token could not be signed
    pub fn issue_access_token(&self, identity: &Identity) -> Result<String, TokenError> {
        let token = self.sign(TokenKind::Access, identity)?;
        tracing::debug!(identity = %identity, kind = %TokenKind::Access, "Token issued");
        Ok(token)
    }

    /// Issue a refresh token for `identity` and record it as the identity's
    /// session, replacing any previous one.
    ///
    /// # Returns
    /// The refresh token, only once it has been stored
    ///
    /// # Errors
    /// * `Configuration` - Token could not be signed
    /// * `StoreUnavailable` - Session write failed (retryable)
    pub async fn issue_refresh_token(&self, identity: &Identity) -> Result<String, TokenError> {
        let token = self.sign(TokenKind::Refresh, identity)?;
        let ttl = self.policy.refresh_validity().to_std().map_err(|e| {
            TokenError::Configuration(format!("Refresh window out of range: {}", e))
        })?;

        self.store
            .set(identity.as_str(), &token, ttl)
            .await
            .map_err(|e| {
                tracing::error!(
                    identity = %identity,
                    error = %e,
                    "Failed to store refresh session"
                );
                TokenError::from(e)
            })?;

        tracing::debug!(identity = %identity, kind = %TokenKind::Refresh, "Token issued");
        Ok(token)
    }

    /// Issue an access token and a refresh token for a freshly authenticated
    /// identity.
    ///
    /// # Errors
    /// * `Configuration` - Token could not be signed
    /// * `StoreUnavailable` - Session write failed (retryable)
    pub async fn issue_token_pair(&self, identity: &Identity) -> Result<TokenPair, TokenError> {
        let access_token = self.issue_access_token(identity)?;
        let refresh_token = self.issue_refresh_token(identity).await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Verify `token` and return the identity it was issued to.
    ///
    /// # Errors
    /// * `InvalidToken` - Forged, tampered, malformed or expired token
    pub fn extract_identity(&self, token: &str) -> Result<Identity, TokenError> {
        let claims = self.verify_live(token)?;
        Identity::new(claims.identity).map_err(|_| TokenError::InvalidToken)
    }

    /// Read the bearer token from the `Authorization` header.
    ///
    /// # Errors
    /// * `MissingHeader` - Header absent
    /// * `MalformedHeader` - No `Bearer ` prefix, not text, or empty token
    pub fn extract_access_token<'a>(
        &self,
        headers: &'a HeaderMap,
    ) -> Result<&'a str, TokenError> {
        request::extract_bearer_token(headers)
    }

    /// Read the raw refresh token from the `Refresh` header.
    ///
    /// # Errors
    /// * `MissingHeader` - Header absent
    /// * `MalformedHeader` - Header empty or not text
    pub fn extract_refresh_token<'a>(
        &self,
        headers: &'a HeaderMap,
    ) -> Result<&'a str, TokenError> {
        request::extract_refresh_header(headers)
    }

    /// Whether `token` has already expired.
    ///
    /// `true` means expired. The signature is verified first; expiry itself is
    /// not an error here.
    ///
    /// # Errors
    /// * `InvalidToken` - Forged, tampered or malformed token
    pub fn is_expired(&self, token: &str) -> Result<bool, TokenError> {
        let claims = self.verify(token)?;
        Ok(claims.is_expired(self.clock.now().timestamp()))
    }

    /// Exchange a live refresh token for a new access token, rotating the
    /// refresh token.
    ///
    /// The refresh token must match the session currently stored for its
    /// identity; a revoked or superseded token is rejected.
    ///
    /// The session read and the rotating write are separate store calls, not
    /// an atomic compare-and-swap. Two concurrent refreshes presenting the
    /// same token can both pass the check and both receive a pair; the last
    /// write decides which refresh token stays current.
    ///
    /// # Errors
    /// * `InvalidToken` - Token invalid, expired, not a refresh token, or not
    ///   the current session
    /// * `StoreUnavailable` - Session read or write failed
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenPair, TokenError> {
        let claims = self.verify_live(refresh_token)?;
        if claims.sub != TokenKind::Refresh {
            tracing::warn!(kind = %claims.sub, "Refresh attempted with non-refresh token");
            return Err(TokenError::InvalidToken);
        }
        let identity = Identity::new(claims.identity).map_err(|_| TokenError::InvalidToken)?;

        let current = self.store.get(identity.as_str()).await?;
        if current.as_deref() != Some(refresh_token) {
            tracing::warn!(identity = %identity, "Refresh token is not the current session");
            return Err(TokenError::InvalidToken);
        }

        let pair = self.issue_token_pair(&identity).await?;

        tracing::info!(identity = %identity, "Session refreshed");
        Ok(pair)
    }

    /// Refresh token currently recorded for `identity`, if any.
    ///
    /// # Errors
    /// * `StoreUnavailable` - Session read failed
    pub async fn current_session(
        &self,
        identity: &Identity,
    ) -> Result<Option<String>, TokenError> {
        Ok(self.store.get(identity.as_str()).await?)
    }

    /// Drop the refresh session of `identity`. Already issued access tokens
    /// stay valid until they expire.
    ///
    /// # Errors
    /// * `StoreUnavailable` - Session delete failed
    pub async fn revoke_session(&self, identity: &Identity) -> Result<(), TokenError> {
        self.store.delete(identity.as_str()).await?;
        tracing::info!(identity = %identity, "Session revoked");
        Ok(())
    }

    /// Verify signature and structure, returning the claims regardless of
    /// expiry.
    pub fn inspect(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify(token)
    }

    fn sign(&self, kind: TokenKind, identity: &Identity) -> Result<String, TokenError> {
        let validity = match kind {
            TokenKind::Access => self.policy.access_validity(),
            TokenKind::Refresh => self.policy.refresh_validity(),
        };
        let claims = Claims::issue(kind, identity, self.clock.now(), validity)?;

        Ok(self.jwt_handler.encode(&claims)?)
    }

    fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.jwt_handler.decode::<Claims>(token).map_err(|e| {
            tracing::warn!(error = %e, "Token verification failed");
            TokenError::from(e)
        })
    }

    fn verify_live(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.verify(token)?;
        if claims.is_expired(self.clock.now().timestamp()) {
            tracing::debug!(kind = %claims.sub, "Token expired");
            return Err(TokenError::InvalidToken);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration as StdDuration;

    use async_trait::async_trait;
    use chrono::Duration;
    use chrono::Utc;
    use http::HeaderValue;
    use mockall::mock;

    use super::*;
    use crate::clock::ManualClock;
    use crate::keys::StaticKeyProvider;
    use crate::session::InMemorySessionStore;
    use crate::session::SessionStoreError;

    const SECRET: &str = "test_secret_key_at_least_32_bytes!";

    mock! {
        pub TestSessionStore {}

        #[async_trait]
        impl SessionStore for TestSessionStore {
            async fn set(
                &self,
                key: &str,
                value: &str,
                ttl: StdDuration,
            ) -> Result<(), SessionStoreError>;
            async fn get(&self, key: &str) -> Result<Option<String>, SessionStoreError>;
            async fn delete(&self, key: &str) -> Result<(), SessionStoreError>;
        }
    }

    fn identity() -> Identity {
        Identity::new("user@example.com".to_string()).unwrap()
    }

    fn service_with_clock(
        clock: Arc<ManualClock>,
    ) -> (TokenService<InMemorySessionStore>, Arc<InMemorySessionStore>) {
        let store = Arc::new(InMemorySessionStore::with_clock(clock.clone()));
        let service = TokenService::new(
            &StaticKeyProvider::new(SECRET),
            Arc::clone(&store),
            TokenPolicy::default(),
        )
        .expect("Failed to build token service")
        .with_clock(clock);
        (service, store)
    }

    fn service() -> TokenService<InMemorySessionStore> {
        service_with_clock(Arc::new(ManualClock::new(Utc::now()))).0
    }

    #[test]
    fn test_access_token_roundtrip() {
        let service = service();

        let token = service.issue_access_token(&identity()).unwrap();

        assert_eq!(service.extract_identity(&token).unwrap(), identity());
        assert_eq!(service.is_expired(&token), Ok(false));
        assert_eq!(service.inspect(&token).unwrap().sub, TokenKind::Access);
    }

    #[test]
    fn test_access_token_expires_after_window() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let (service, _) = service_with_clock(clock.clone());
        let token = service.issue_access_token(&identity()).unwrap();

        clock.advance(Duration::hours(6));
        assert_eq!(service.is_expired(&token), Ok(false));
        assert!(service.extract_identity(&token).is_ok());

        clock.advance(Duration::seconds(1));
        assert_eq!(service.is_expired(&token), Ok(true));
        assert_eq!(
            service.extract_identity(&token),
            Err(TokenError::InvalidToken)
        );
    }

    #[test]
    fn test_access_expires_before_refresh() {
        let service = service();

        let access_token = service.issue_access_token(&identity()).unwrap();
        let access = service.inspect(&access_token).unwrap();
        let refresh_claims = Claims::issue(
            TokenKind::Refresh,
            &identity(),
            Utc::now(),
            service.policy().refresh_validity(),
        )
        .unwrap();

        assert!(access.exp < refresh_claims.exp);
    }

    #[test]
    fn test_issue_near_end_of_time_is_configuration_error() {
        let latest = chrono::DateTime::<Utc>::MAX_UTC - Duration::hours(1);
        let service = service_with_clock(Arc::new(ManualClock::new(latest))).0;

        assert!(matches!(
            service.issue_access_token(&identity()),
            Err(TokenError::Configuration(_))
        ));
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let service = service();
        let other = TokenService::new(
            &StaticKeyProvider::new("another_secret_key_at_least_32_bytes"),
            Arc::new(InMemorySessionStore::new()),
            TokenPolicy::default(),
        )
        .unwrap();

        let token = other.issue_access_token(&identity()).unwrap();

        assert_eq!(service.extract_identity(&token), Err(TokenError::InvalidToken));
        assert_eq!(service.is_expired(&token), Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_malformed_token_rejected() {
        let service = service();

        assert_eq!(service.extract_identity(""), Err(TokenError::InvalidToken));
        assert_eq!(
            service.extract_identity("not-a-token"),
            Err(TokenError::InvalidToken)
        );
        assert_eq!(service.is_expired("a.b.c"), Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_missing_key_fails_construction() {
        let result = TokenService::new(
            &StaticKeyProvider::new(""),
            Arc::new(InMemorySessionStore::new()),
            TokenPolicy::default(),
        );
        assert!(matches!(result, Err(TokenError::Configuration(_))));
    }

    #[test]
    fn test_extract_access_token_from_headers() {
        let service = service();
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc123"),
        );

        assert_eq!(service.extract_access_token(&headers), Ok("abc123"));

        headers.insert(http::header::AUTHORIZATION, HeaderValue::from_static("abc123"));
        assert_eq!(
            service.extract_access_token(&headers),
            Err(TokenError::MalformedHeader("Authorization"))
        );

        assert_eq!(
            service.extract_access_token(&HeaderMap::new()),
            Err(TokenError::MissingHeader("Authorization"))
        );
    }

    #[tokio::test]
    async fn test_refresh_token_written_to_store() {
        let mut store = MockTestSessionStore::new();
        store
            .expect_set()
            .withf(|key, value, ttl| {
                key.to_string() == "user@example.com"
                    && value.split('.').count() == 3
                    && *ttl == StdDuration::from_secs(48 * 60 * 60)
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = TokenService::new(
            &StaticKeyProvider::new(SECRET),
            Arc::new(store),
            TokenPolicy::default(),
        )
        .unwrap();

        let token = service.issue_refresh_token(&identity()).await.unwrap();
        assert_eq!(service.inspect(&token).unwrap().sub, TokenKind::Refresh);
    }

    #[tokio::test]
    async fn test_refresh_token_store_failure_surfaces() {
        let mut store = MockTestSessionStore::new();
        store
            .expect_set()
            .times(1)
            .returning(|_, _, _| {
                Err(SessionStoreError::Unavailable(
                    "connection refused".to_string(),
                ))
            });

        let service = TokenService::new(
            &StaticKeyProvider::new(SECRET),
            Arc::new(store),
            TokenPolicy::default(),
        )
        .unwrap();

        let result = service.issue_refresh_token(&identity()).await;
        let err = result.unwrap_err();
        assert!(matches!(err, TokenError::StoreUnavailable(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_refresh_rotates_session() {
        let (service, store) = service_with_clock(Arc::new(ManualClock::new(Utc::now())));

        let original = service.issue_refresh_token(&identity()).await.unwrap();
        let pair = service.refresh_access_token(&original).await.unwrap();

        assert_ne!(pair.refresh_token, original);
        assert_eq!(service.extract_identity(&pair.access_token).unwrap(), identity());
        assert_eq!(
            store.get("user@example.com").await.unwrap(),
            Some(pair.refresh_token.clone())
        );

        // The superseded refresh token no longer works
        assert_eq!(
            service.refresh_access_token(&original).await,
            Err(TokenError::InvalidToken)
        );
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let service = service();
        service.issue_refresh_token(&identity()).await.unwrap();
        let access = service.issue_access_token(&identity()).unwrap();

        assert_eq!(
            service.refresh_access_token(&access).await,
            Err(TokenError::InvalidToken)
        );
    }

    #[tokio::test]
    async fn test_refresh_rejects_revoked_session() {
        let service = service();
        let refresh = service.issue_refresh_token(&identity()).await.unwrap();

        service.revoke_session(&identity()).await.unwrap();

        assert_eq!(service.current_session(&identity()).await, Ok(None));
        assert_eq!(
            service.refresh_access_token(&refresh).await,
            Err(TokenError::InvalidToken)
        );
    }

    #[tokio::test]
    async fn test_refresh_rejects_expired_token() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let (service, _) = service_with_clock(clock.clone());
        let refresh = service.issue_refresh_token(&identity()).await.unwrap();

        clock.advance(Duration::hours(49));

        assert_eq!(
            service.refresh_access_token(&refresh).await,
            Err(TokenError::InvalidToken)
        );
    }

    #[tokio::test]
    async fn test_revoke_store_failure_surfaces() {
        let mut store = MockTestSessionStore::new();
        store
            .expect_delete()
            .withf(|key| key.to_string() == "user@example.com")
            .times(1)
            .returning(|_| Err(SessionStoreError::Unavailable("timeout".to_string())));

        let service = TokenService::new(
            &StaticKeyProvider::new(SECRET),
            Arc::new(store),
            TokenPolicy::default(),
        )
        .unwrap();

        assert!(matches!(
            service.revoke_session(&identity()).await,
            Err(TokenError::StoreUnavailable(_))
        ));
    }
}
