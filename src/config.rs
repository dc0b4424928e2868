use std::{env, fmt::Display, str::FromStr};

use anyhow::{Context, Result};
use tracing::info;

/// Service configuration, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub port: u16,
    /// Optional JSON catalog the store is seeded from.
    pub catalog_path: Option<String>,
    pub cors_max_age_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 8000,
            catalog_path: None,
            cors_max_age_secs: 60 * 60,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            bind_addr: try_load("BIND_ADDR", defaults.bind_addr)?,
            port: try_load("RUST_PORT", defaults.port)?,
            catalog_path: env::var("CAMPUS_CATALOG").ok().filter(|p| !p.is_empty()),
            cors_max_age_secs: try_load("CORS_MAX_AGE_SECS", defaults.cors_max_age_secs)?,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn try_load<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr + Display,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {key} value '{raw}'")),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}
