use std::sync::Arc;
use std::time::Duration;

use listkeeper::app::{AppState, app};
use listkeeper::core::auth::{
    HashError, HasherConfig, JwtConfig, JwtError, JwtService, Pbkdf2Hasher,
};
use listkeeper::core::config::Config;
use listkeeper::core::db::{DbConfig, MemoryStore, SessionRepository, create_pool_with_migrations};

/// Signing key used by debug builds when JWT_SECRET is unset
const DEV_JWT_SECRET: &str = "listkeeper-development-secret-do-not-deploy";

/// Password salt used by debug builds when PASSWORD_SALT is unset
const DEV_PASSWORD_SALT: &str = "listkeeper-development-salt";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file (if exists)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let config = Config::from_env();

    // Log config status (without revealing secrets)
    tracing::info!(
        "Config loaded: database={}, jwt_secret={}, password_salt={}",
        config.has_database(),
        config.has_jwt_secret(),
        config.has_password_salt()
    );

    let jwt = JwtService::new(jwt_config()?);
    let hasher = Arc::new(Pbkdf2Hasher::new(hasher_config()?));

    let state = if config.has_database() {
        let pool = create_pool_with_migrations(&DbConfig::from_env()?).await?;

        let removed = SessionRepository::new(pool.clone()).cleanup_expired().await?;
        tracing::info!("Removed {} expired refresh sessions", removed);

        AppState::postgres(pool, hasher, jwt)
    } else {
        tracing::warn!("DATABASE_URL not set, data is kept in memory only");
        AppState::in_memory(MemoryStore::new(), hasher, jwt)
    };

    let state = state.request_timeout(Duration::from_secs(config.request_timeout_secs));
    let addr = config.socket_addr()?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on http://{}", addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn jwt_config() -> Result<JwtConfig, JwtError> {
    match JwtConfig::from_env() {
        Err(JwtError::MissingSecret) if cfg!(debug_assertions) => {
            tracing::warn!("JWT_SECRET not set, using development key");
            Ok(JwtConfig::new(DEV_JWT_SECRET).with_env_overrides())
        }
        other => other,
    }
}

fn hasher_config() -> Result<HasherConfig, HashError> {
    match HasherConfig::from_env() {
        Err(HashError::MissingSalt) if cfg!(debug_assertions) => {
            tracing::warn!("PASSWORD_SALT not set, using development salt");
            Ok(HasherConfig::new(DEV_PASSWORD_SALT).with_env_overrides())
        }
        other => other,
    }
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
