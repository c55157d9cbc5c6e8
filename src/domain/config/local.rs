use std::{env, path::PathBuf};

use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_STORAGE_DIR: &str = "images";
pub const DEFAULT_UPLOAD_SIZE_LIMIT: u64 = 5 * 1024 * 1024;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    #[serde(rename = "disk")]
    Disk,
    #[serde(rename = "inline")]
    Inline,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Disk => "disk",
            Provider::Inline => "inline",
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disk" => Ok(Provider::Disk),
            "inline" => Ok(Provider::Inline),
            other => Err(ConfigError::Invalid {
                variable: "STORAGE_PROVIDER",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {variable}")]
    Invalid {
        variable: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone)]
pub struct LocalConfig {
    pub port: u16,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub provider: Provider,
    pub storage_dir: PathBuf,
    pub upload_size_limit: u64,
    pub cors_allowed_origins: Option<Vec<String>>,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            provider: Provider::Disk,
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            upload_size_limit: DEFAULT_UPLOAD_SIZE_LIMIT,
            cors_allowed_origins: None,
        }
    }
}

impl LocalConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source. Blank
    /// values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let port = match get("PORT") {
            Some(value) => parse_var("PORT", &value)?,
            None => defaults.port,
        };
        let max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            Some(value) => parse_var("DATABASE_MAX_CONNECTIONS", &value)?,
            None => defaults.max_connections,
        };
        let provider = match get("STORAGE_PROVIDER") {
            Some(value) => value.parse()?,
            None => defaults.provider,
        };
        let upload_size_limit = match get("UPLOAD_SIZE_LIMIT") {
            Some(value) => parse_var("UPLOAD_SIZE_LIMIT", &value)?,
            None => defaults.upload_size_limit,
        };
        let storage_dir = get("IMAGE_STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.storage_dir);
        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS").map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        Ok(Self {
            port,
            database_url: get("DATABASE_URL"),
            max_connections,
            provider,
            storage_dir,
            upload_size_limit,
            cors_allowed_origins,
        })
    }

    pub fn record_store(&self) -> &'static str {
        if self.database_url.is_some() {
            "postgres"
        } else {
            "memory"
        }
    }
}

fn parse_var<T: std::str::FromStr>(variable: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        variable,
        value: value.to_string(),
    })
}
