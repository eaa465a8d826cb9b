use anyhow::{bail, Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub port: u16,
    pub rust_log: String,
    /// Blend factor used when a request does not pass `maturity_weight`.
    pub default_maturity_weight: f64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let default_maturity_weight = optional_env("DEFAULT_MATURITY_WEIGHT", "0.3")
            .parse::<f64>()
            .context("DEFAULT_MATURITY_WEIGHT must be a number")?;
        if !(0.0..=1.0).contains(&default_maturity_weight) {
            bail!("DEFAULT_MATURITY_WEIGHT must be between 0 and 1, got {default_maturity_weight}");
        }

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            db_max_connections: optional_env("DB_MAX_CONNECTIONS", "10")
                .parse::<u32>()
                .context("DB_MAX_CONNECTIONS must be a positive integer")?,
            port: optional_env("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG", "info"),
            default_maturity_weight,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
