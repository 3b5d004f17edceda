use anyhow::{Context, Result};

/// Expected payment for a Pro upgrade when `UPGRADE_AMOUNT` is unset.
const DEFAULT_UPGRADE_AMOUNT: i32 = 299;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub ai_api_key: String,
    /// The designated administrator identity for upgrade review.
    pub admin_email: String,
    /// Expected payment amount for an upgrade submission.
    pub upgrade_amount: i32,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            ai_api_key: require_env("AI_API_KEY")?,
            admin_email: require_env("ADMIN_EMAIL")?,
            upgrade_amount: match std::env::var("UPGRADE_AMOUNT") {
                Ok(v) => v
                    .parse::<i32>()
                    .context("UPGRADE_AMOUNT must be an integer")?,
                Err(_) => DEFAULT_UPGRADE_AMOUNT,
            },
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
