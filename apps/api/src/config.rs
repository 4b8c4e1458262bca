use std::path::PathBuf;

use anyhow::{Context, Result};

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_DAILY_LIMIT: u64 = 10;

/// Application configuration loaded from environment variables.
/// Every variable has a default; the proxy answers 500 when `GEMINI_API_KEY` is unset.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding `settings.json` and `history.json`.
    pub data_dir: PathBuf,
    /// Remote counter store for the proxy rate limiter. In-memory map when absent.
    pub redis_url: Option<String>,
    /// Server-held key used only by the rate-limited proxy.
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub daily_limit: u64,
    /// Sent as `HTTP-Referer` to aggregator providers.
    pub app_url: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .context("PORT must be a valid port number")?;

        let daily_limit = match optional_env("DAILY_LIMIT") {
            Some(raw) => raw
                .parse::<u64>()
                .context("DAILY_LIMIT must be a positive integer")?,
            None => DEFAULT_DAILY_LIMIT,
        };

        Ok(Config {
            data_dir: optional_env("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./data")),
            redis_url: optional_env("REDIS_URL"),
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            gemini_base_url: optional_env("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            daily_limit,
            app_url: optional_env("APP_URL").unwrap_or_else(|| format!("http://localhost:{port}")),
            port,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from("./data"),
            redis_url: None,
            gemini_api_key: None,
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            daily_limit: DEFAULT_DAILY_LIMIT,
            app_url: "http://localhost:8080".to_string(),
            port: 8080,
            rust_log: "info".to_string(),
        }
    }
}

/// Reads an env var, treating blank values as unset.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
