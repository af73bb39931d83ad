use std::env;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub mongodb_uri: String,
    pub mongodb_database: String,
    pub environment: String,
    pub log_level: String,
    pub log_format: LogFormat,
    pub db_max_pool_size: u32,
    pub db_connect_timeout_ms: u64,
    pub cors_origin: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup, so tests don't
    /// have to mutate the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mongodb_uri = lookup("MONGODB_URI")
            .filter(|uri| !uri.trim().is_empty())
            .ok_or_else(|| AppError::Config("MONGODB_URI must be set".to_string()))?;

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Compact,
        };

        Ok(Self {
            http_port: parse_or_default(&lookup, "PORT", 3000)?,
            mongodb_uri,
            mongodb_database: lookup("MONGODB_DATABASE")
                .unwrap_or_else(|| "fleet_checkin".to_string()),
            environment: lookup("APP_ENV").unwrap_or_else(|| "development".to_string()),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_format,
            db_max_pool_size: parse_or_default(&lookup, "DB_MAX_POOL_SIZE", 10)?,
            db_connect_timeout_ms: parse_or_default(&lookup, "DB_CONNECT_TIMEOUT_MS", 5000)?,
            cors_origin: lookup("CORS_ORIGIN").filter(|origin| !origin.is_empty()),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Config(format!("invalid {key}: {err}"))),
        None => Ok(default),
    }
}
