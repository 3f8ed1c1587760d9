use anyhow::{Context, Result};

const DEFAULT_ANALYSIS_ENDPOINT: &str = "https://api.deepseek.com/v1/chat/completions";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Optional: without it the analysis endpoints answer with a
    /// provider-unconfigured error while everything else keeps working.
    pub deepseek_api_key: Option<String>,
    pub deepseek_endpoint: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            jwt_secret: require_env("JWT_SECRET")?,
            deepseek_api_key: std::env::var("DEEPSEEK_API_KEY").ok(),
            deepseek_endpoint: std::env::var("DEEPSEEK_API_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_ANALYSIS_ENDPOINT.to_string()),
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
