use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Directory holding the trainer's artifact set.
    pub artifact_dir: PathBuf,
    pub port: u16,
    pub rust_log: String,
    /// Prediction history older than this is purged on read.
    pub history_retention_days: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            artifact_dir: std::env::var("ARTIFACT_DIR")
                .unwrap_or_else(|_| "artifacts".to_string())
                .into(),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            history_retention_days: std::env::var("HISTORY_RETENTION_DAYS")
                .unwrap_or_else(|_| "15".to_string())
                .parse::<i64>()
                .ok()
                .filter(|days| *days > 0)
                .context("HISTORY_RETENTION_DAYS must be a positive number of days")?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
