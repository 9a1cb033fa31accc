use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use anyhow::{anyhow, Result};
use log::info;

pub struct Config {
    pub port: u16,
    pub db_path: PathBuf,
    pub catalog_path: Option<PathBuf>,
    pub require_email: bool,
    pub cors_max_age_secs: u64,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; `load` uses the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            port: try_load(&lookup, "FORECAST_PORT", "8080")?,
            db_path: try_load(&lookup, "FORECAST_DB_PATH", "data/forecast.sqlite3")?,
            catalog_path: lookup("FORECAST_CATALOG_PATH")
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from),
            require_email: try_load(&lookup, "FORECAST_REQUIRE_EMAIL", "true")?,
            cors_max_age_secs: try_load(&lookup, "FORECAST_CORS_MAX_AGE_SECS", "3600")?,
        })
    }
}

fn try_load<F, T>(lookup: &F, key: &str, default: &str) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    lookup(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .trim()
        .parse()
        .map_err(|e| anyhow!("Invalid {key} value: {e}"))
}
