//! Token authentication library
//!
//! Issues short-lived access tokens and longer-lived refresh tokens, verifies
//! incoming access tokens and extracts caller identity from request headers:
//! - HS256 JWT signing and verification
//! - Refresh sessions kept in a pluggable session store (in-memory or Redis)
//! - Bearer token extraction from `http` header maps
//!
//! The signing key provider, session store and clock are injected at
//! construction; the service itself holds no mutable state.
//!
//! # Examples
//!
//! ## Access Tokens
//! ```
//! use std::sync::Arc;
//!
//! use token_auth::{Identity, InMemorySessionStore, StaticKeyProvider, TokenPolicy, TokenService};
//!
//! let service = TokenService::new(
//!     &StaticKeyProvider::new("secret_key_at_least_32_bytes_long!"),
//!     Arc::new(InMemorySessionStore::new()),
//!     TokenPolicy::default(),
//! )
//! .unwrap();
//!
//! let identity = Identity::new("user@example.com".to_string()).unwrap();
//! let token = service.issue_access_token(&identity).unwrap();
//!
//! assert_eq!(service.extract_identity(&token).unwrap(), identity);
//! assert!(!service.is_expired(&token).unwrap());
//! ```
//!
//! ## Request Headers
//! ```
//! use http::{HeaderMap, HeaderValue};
//! use token_auth::TokenError;
//!
//! let mut headers = HeaderMap::new();
//! headers.insert("authorization", HeaderValue::from_static("Bearer abc123"));
//! assert_eq!(token_auth::request::extract_bearer_token(&headers), Ok("abc123"));
//!
//! headers.insert("authorization", HeaderValue::from_static("abc123"));
//! assert_eq!(
//!     token_auth::request::extract_bearer_token(&headers),
//!     Err(TokenError::MalformedHeader("Authorization"))
//! );
//! ```

pub mod clock;
pub mod config;
pub mod errors;
pub mod identity;
pub mod jwt;
pub mod keys;
pub mod policy;
pub mod request;
pub mod service;
pub mod session;

// Re-export commonly used items
pub use clock::Clock;
pub use clock::ManualClock;
pub use clock::SystemClock;
pub use errors::IdentityError;
pub use errors::TokenError;
pub use identity::Identity;
pub use jwt::Claims;
pub use jwt::TokenKind;
pub use keys::EnvKeyProvider;
pub use keys::SigningKey;
pub use keys::SigningKeyProvider;
pub use keys::StaticKeyProvider;
pub use policy::TokenPolicy;
pub use service::TokenPair;
pub use service::TokenService;
pub use session::InMemorySessionStore;
pub use session::RedisSessionStore;
pub use session::SessionStore;
pub use session::SessionStoreError;
