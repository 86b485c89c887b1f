use std::sync::Arc;

use chrono::Utc;
use token_auth::InMemorySessionStore;
use token_auth::ManualClock;
use token_auth::StaticKeyProvider;
use token_auth::TokenPolicy;
use token_auth::TokenService;

pub const TEST_SECRET: &str = "test-secret-key-for-jwt-signing-at-least-32-bytes";

/// Token service wired to an in-memory store and a manually driven clock
pub struct TestApp {
    pub service: TokenService<InMemorySessionStore>,
    pub store: Arc<InMemorySessionStore>,
    pub clock: Arc<ManualClock>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_secret(TEST_SECRET)
    }

    pub fn with_secret(secret: &str) -> Self {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = Arc::new(InMemorySessionStore::with_clock(clock.clone()));

        let service = TokenService::new(
            &StaticKeyProvider::new(secret),
            Arc::clone(&store),
            TokenPolicy::default(),
        )
        .expect("Failed to create token service")
        .with_clock(clock.clone());

        Self {
            service,
            store,
            clock,
        }
    }
}
