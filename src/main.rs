//! User Auth API server
//! Mission: Register users, hand out bearer tokens, serve their profiles

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use userauth_backend::{
    auth::{AuthService, AuthState, JwtHandler, SqliteUserStore, UserStore},
    create_router, Config,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().context("Invalid configuration")?;
    init_tracing();

    info!("🚀 Starting {} ({})", config.app_name, config.app_env);

    if config.uses_dev_secret() {
        warn!("⚠️  JWT_SECRET not set, using the development secret. CHANGE IT IN PRODUCTION!");
    }

    let user_store: Arc<dyn UserStore> = Arc::new(
        SqliteUserStore::new(&config.database_path).context("Failed to open user database")?,
    );
    info!("🔐 User database ready at: {}", config.database_path);

    let auth_service = Arc::new(AuthService::with_cost(user_store, config.bcrypt_cost));
    let jwt_handler = Arc::new(JwtHandler::new(
        &config.jwt_secret,
        config.token_lifetime(),
    ));

    let app = create_router(AuthState::new(auth_service, jwt_handler));

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("✅ Server running on http://{}", addr);
    info!("📚 API Endpoints:");
    info!("   POST   /api/auth/register");
    info!("   POST   /api/auth/login");
    info!("   GET    /api/auth/profile (Protected)");
    info!("   GET    /health");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("👋 Server stopped");
    Ok(())
}

/// Initialize tracing with env-configurable filtering
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "userauth_backend=debug,userauth=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}
