//! Startup configuration
//!
//! Every flag can also be supplied through the environment (or a `.env` file).
//! The resulting value is built once in `main` and handed to the components
//! that need it.

use crate::auth::password::{DEFAULT_COST, MAX_COST, MIN_COST};
use anyhow::{bail, Result};
use chrono::Duration;
use clap::Parser;
use std::path::Path;

/// Ten years
pub const MAX_JWT_EXPIRE_HOURS: i64 = 24 * 365 * 10;

pub const DEV_JWT_SECRET: &str = "dev-secret-change-in-production-minimum-32-characters";

/// User authentication API server
#[derive(Parser, Debug, Clone)]
#[command(name = "userauth")]
#[command(about = "Register, login and profile API guarded by bearer tokens")]
pub struct Config {
    /// Interface to bind
    #[arg(long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "SERVER_PORT", default_value = "8080")]
    pub port: u16,

    /// Path to the SQLite user database
    #[arg(long, env = "AUTH_DB_PATH", default_value = "userauth.db")]
    pub database_path: String,

    /// Symmetric secret used to sign tokens
    #[arg(long, env = "JWT_SECRET", default_value = DEV_JWT_SECRET, hide_env_values = true)]
    pub jwt_secret: String,

    /// Token lifetime in hours
    #[arg(long, env = "JWT_EXPIRE_HOURS", default_value = "24")]
    pub jwt_expire_hours: i64,

    /// bcrypt work factor
    #[arg(long, env = "BCRYPT_COST", default_value_t = DEFAULT_COST)]
    pub bcrypt_cost: u32,

    #[arg(long, env = "APP_NAME", default_value = "User Auth API")]
    pub app_name: String,

    #[arg(long, env = "APP_ENV", default_value = "development")]
    pub app_env: String,
}

impl Config {
    /// Parse flags and environment, then validate.
    pub fn load() -> Result<Self> {
        load_env();
        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            bail!("JWT_SECRET must not be empty");
        }
        if !(1..=MAX_JWT_EXPIRE_HOURS).contains(&self.jwt_expire_hours) {
            bail!(
                "JWT_EXPIRE_HOURS must be between 1 and {}",
                MAX_JWT_EXPIRE_HOURS
            );
        }
        if !(MIN_COST..=MAX_COST).contains(&self.bcrypt_cost) {
            bail!("BCRYPT_COST must be between {} and {}", MIN_COST, MAX_COST);
        }
        Ok(())
    }

    pub fn token_lifetime(&self) -> Duration {
        Duration::hours(self.jwt_expire_hours.clamp(1, MAX_JWT_EXPIRE_HOURS))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

fn load_env() {
    // 1) Standard dotenv search (cwd + parents)
    let _ = dotenv::dotenv();

    // 2) Also try the crate root (common when running with --manifest-path from elsewhere)
    let manifest_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if manifest_env.exists() {
        let _ = dotenv::from_path(&manifest_env);
    }
}
