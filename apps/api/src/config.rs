use anyhow::{Context, Result};

use crate::llm_client::DEFAULT_MODEL;

/// Application configuration loaded from environment variables.
///
/// Everything has a workable default except the upstream credential, which
/// may be absent: requests that need it then fail with a structured error
/// instead of preventing startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub rate_limit_per_day: u32,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://kcalcal.db?mode=rwc".to_string()),
            gemini_api_key: std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
            gemini_model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            rate_limit_per_day: std::env::var("RATE_LIMIT_PER_DAY")
                .unwrap_or_else(|_| "10".to_string())
                .parse::<u32>()
                .context("RATE_LIMIT_PER_DAY must be a non-negative integer")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}
