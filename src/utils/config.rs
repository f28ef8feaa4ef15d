use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Result, Context, anyhow};
use tracing::info;

use crate::error::{EtlError, EtlResult};

pub const DEFAULT_API_BASE_URL: &str = "https://api.harvardartmuseums.org";
pub const DEFAULT_DB_PATH: &str = "harvard_artifacts.db";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

const KEY_API_BASE_URL: &str = "ARTIFACTS_API_BASE_URL";
const KEY_API_KEY: &str = "ARTIFACTS_API_KEY";
const KEY_DB_PATH: &str = "ARTIFACTS_DB_PATH";
const KEY_HTTP_TIMEOUT: &str = "ARTIFACTS_HTTP_TIMEOUT_SECS";

/// Settings shared by the fetcher and the store. Built once in `main` and
/// handed to each component.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub api_key: Option<String>,
    pub db_path: PathBuf,
    pub http_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: None,
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    /// Main entry point to get the configuration.
    /// Process environment wins over the `.env` file, which wins over defaults.
    pub fn load(env_file: Option<&Path>) -> Result<Self> {
        let path = env_file
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".env"));

        if path.exists() {
            // Existing process variables are left alone, so they keep priority.
            dotenv::from_path(&path).with_context(|| format!("Failed to load config file {:?}", path))?;
            info!("Loaded configuration from {:?}", path);
        } else if env_file.is_some() {
            return Err(anyhow!("Config file {:?} does not exist", path));
        }

        let config = Self::from_lookup(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_lookup<F>(lookup: F) -> EtlResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup(KEY_API_BASE_URL) {
            config.api_base_url = url.trim().trim_end_matches('/').to_string();
        }
        config.api_key = lookup(KEY_API_KEY).map(|k| k.trim().to_string());
        if let Some(path) = lookup(KEY_DB_PATH) {
            config.db_path = PathBuf::from(path.trim());
        }
        if let Some(raw) = lookup(KEY_HTTP_TIMEOUT) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                EtlError::Config(format!("{} must be a whole number of seconds, got '{}'", KEY_HTTP_TIMEOUT, raw))
            })?;
            if secs == 0 {
                return Err(EtlError::Config(format!("{} must be greater than zero", KEY_HTTP_TIMEOUT)));
            }
            config.http_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn require_api_key(&self) -> EtlResult<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| EtlError::Config(format!("{} is not set", KEY_API_KEY)))
    }
}

/// Writes a `.env` template with every key the tool reads.
pub fn write_env_template(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(anyhow!("{:?} already exists, refusing to overwrite", path));
    }
    let mut file = File::create(path).context("Failed to create .env file")?;
    writeln!(file, "{}={}", KEY_API_BASE_URL, DEFAULT_API_BASE_URL)?;
    writeln!(file, "{}=", KEY_API_KEY)?;
    writeln!(file, "{}={}", KEY_DB_PATH, DEFAULT_DB_PATH)?;
    writeln!(file, "{}={}", KEY_HTTP_TIMEOUT, DEFAULT_HTTP_TIMEOUT_SECS)?;
    Ok(())
}
