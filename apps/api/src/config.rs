use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::docx::LockRetry;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    /// Where tailored resumes and cover letters are written.
    pub output_dir: PathBuf,
    pub activity_log_path: PathBuf,
    pub port: u16,
    pub rust_log: String,
    pub lock_retry_attempts: u32,
    pub lock_retry_delay_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let output_dir = PathBuf::from(
            std::env::var("OUTPUT_DIR").unwrap_or_else(|_| "./tailored".to_string()),
        );
        let activity_log_path = std::env::var("ACTIVITY_LOG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| output_dir.join("activity_log.jsonl"));

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            output_dir,
            activity_log_path,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            lock_retry_attempts: parse_env("LOCK_RETRY_ATTEMPTS", 5)?,
            lock_retry_delay_ms: parse_env("LOCK_RETRY_DELAY_MS", 500)?,
        })
    }

    pub fn lock_retry(&self) -> LockRetry {
        LockRetry {
            attempts: self.lock_retry_attempts,
            delay: Duration::from_millis(self.lock_retry_delay_ms),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("'{key}' must be a valid value")),
        Err(_) => Ok(default),
    }
}
