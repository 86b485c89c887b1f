use std::env;

use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::errors::TokenError;
use crate::keys::SigningKey;
use crate::keys::SigningKeyProvider;
use crate::policy::TokenPolicy;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub jwt: JwtConfig,
    #[serde(default)]
    pub session_store: SessionStoreConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    #[serde(default)]
    pub secret: String,
    #[serde(default = "default_access_token_hours")]
    pub access_token_hours: i64,
    #[serde(default = "default_refresh_token_hours")]
    pub refresh_token_hours: i64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    #[default]
    Memory,
    Redis,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionStoreConfig {
    #[serde(default)]
    pub backend: SessionBackend,
    pub url: Option<String>,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for SessionStoreConfig {
    fn default() -> Self {
        Self {
            backend: SessionBackend::default(),
            url: None,
            key_prefix: default_key_prefix(),
        }
    }
}

fn default_access_token_hours() -> i64 {
    TokenPolicy::DEFAULT_ACCESS_HOURS
}

fn default_refresh_token_hours() -> i64 {
    TokenPolicy::DEFAULT_REFRESH_HOURS
}

fn default_key_prefix() -> String {
    "session:".to_string()
}

impl JwtConfig {
    /// Validity windows described by this configuration.
    ///
    /// # Errors
    /// * `Configuration` - Windows are not positive or not ordered
    pub fn policy(&self) -> Result<TokenPolicy, TokenError> {
        TokenPolicy::from_hours(self.access_token_hours, self.refresh_token_hours)
    }
}

impl SigningKeyProvider for JwtConfig {
    fn signing_key(&self) -> Result<SigningKey, TokenError> {
        SigningKey::new(&self.secret)
            .map_err(|_| TokenError::Configuration("jwt.secret is not set".to_string()))
    }
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (JWT__SECRET, SESSION_STORE__URL, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: JWT__SECRET=... overrides jwt.secret
            .add_source(Environment::default().separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;

        Ok(config)
    }
}
