use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use clap::Subcommand;
use token_auth::config::Config;
use token_auth::config::SessionBackend;
use token_auth::Identity;
use token_auth::InMemorySessionStore;
use token_auth::RedisSessionStore;
use token_auth::SessionStore;
use token_auth::TokenService;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Issue, inspect and revoke authentication tokens.
#[derive(Parser)]
#[command(name = "token-auth", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Issue an access token and a refresh session for an identity
    Issue { identity: String },

    /// Verify a token and print its claims
    Inspect { token: String },

    /// Exchange a refresh token for a new token pair
    Refresh { refresh_token: String },

    /// Drop the refresh session of an identity
    Revoke { identity: String },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Issue { .. } => "issue",
            Command::Inspect { .. } => "inspect",
            Command::Refresh { .. } => "refresh",
            Command::Revoke { .. } => "revoke",
        }
    }

    /// Commands that read or drop a session written by an earlier run.
    fn requires_persistent_store(&self) -> bool {
        matches!(self, Command::Refresh { .. } | Command::Revoke { .. })
    }
}

/// The memory backend lives only as long as one CLI invocation.
fn check_backend(backend: &SessionBackend, command: &Command) -> Result<(), anyhow::Error> {
    if *backend == SessionBackend::Memory && command.requires_persistent_store() {
        anyhow::bail!(
            "`{}` requires a persistent session store; set session_store.backend = \"redis\"",
            command.name()
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "token_auth=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::load().context("Failed to load configuration")?;
    check_backend(&config.session_store.backend, &cli.command)?;
    let policy = config.jwt.policy()?;

    tracing::info!(
        backend = ?config.session_store.backend,
        access_token_hours = config.jwt.access_token_hours,
        refresh_token_hours = config.jwt.refresh_token_hours,
        "Configuration loaded"
    );

    match config.session_store.backend {
        SessionBackend::Memory => {
            let store = Arc::new(InMemorySessionStore::new());
            let service = TokenService::new(&config.jwt, store, policy)?;
            run(&service, cli.command).await
        }
        SessionBackend::Redis => {
            let url = config
                .session_store
                .url
                .as_deref()
                .context("session_store.url is required for the redis backend")?;
            let prefix = config.session_store.key_prefix.clone();
            let store = Arc::new(RedisSessionStore::connect(url, prefix).await?);
            let service = TokenService::new(&config.jwt, store, policy)?;
            run(&service, cli.command).await
        }
    }
}

async fn run<S: SessionStore>(
    service: &TokenService<S>,
    command: Command,
) -> Result<(), anyhow::Error> {
    match command {
        Command::Issue { identity } => {
            let identity = Identity::new(identity)?;
            let pair = service.issue_token_pair(&identity).await?;
            println!("access_token={}", pair.access_token);
            println!("refresh_token={}", pair.refresh_token);
        }
        Command::Inspect { token } => {
            let claims = service.inspect(&token)?;
            let expired = service.is_expired(&token)?;
            println!("kind={}", claims.sub);
            println!("identity={}", claims.identity);
            match claims.expires_at() {
                Some(expires_at) => println!("expires_at={}", expires_at.to_rfc3339()),
                None => println!("expires_at={}", claims.exp),
            }
            println!("expired={}", expired);
        }
        Command::Refresh { refresh_token } => {
            let pair = service.refresh_access_token(&refresh_token).await?;
            println!("access_token={}", pair.access_token);
            println!("refresh_token={}", pair.refresh_token);
        }
        Command::Revoke { identity } => {
            let identity = Identity::new(identity)?;
            service.revoke_session(&identity).await?;
            println!("revoked={}", identity);
        }
    }

    Ok(())
}
