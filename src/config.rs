//! Runtime configuration, read from `SHARECLOUD_*` environment variables.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ADMIN_EMAIL: &str = "admin@sharecloud.com";
pub const DEFAULT_ADMIN_PASSWORD: &str = "password123";

const DEFAULT_DB_PATH: &str = "sharecloud.db";
const DEFAULT_PUBLIC_URL: &str = "http://127.0.0.1:8080";
const DEFAULT_UPLOAD_DELAY_MS: u64 = 1500;
const DEFAULT_PROGRESS_TICK_MS: u64 = 150;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_STORAGE_QUOTA_BYTES: usize = 5 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: String, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen: SocketAddr,
    pub database_path: String,
    pub public_url: String,
    pub admin_email: String,
    pub admin_password: String,
    pub upload_delay: Duration,
    pub progress_tick: Duration,
    pub max_upload_bytes: usize,
    /// Largest projection the durable store accepts; `None` means unlimited
    pub storage_quota_bytes: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            database_path: DEFAULT_DB_PATH.to_string(),
            public_url: DEFAULT_PUBLIC_URL.to_string(),
            admin_email: DEFAULT_ADMIN_EMAIL.to_string(),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            upload_delay: Duration::from_millis(DEFAULT_UPLOAD_DELAY_MS),
            progress_tick: Duration::from_millis(DEFAULT_PROGRESS_TICK_MS),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            storage_quota_bytes: Some(DEFAULT_STORAGE_QUOTA_BYTES),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let quota: usize = parse(&lookup, "SHARECLOUD_STORAGE_QUOTA_BYTES", DEFAULT_STORAGE_QUOTA_BYTES)?;

        Ok(Self {
            listen: parse(&lookup, "SHARECLOUD_LISTEN", default_listen())?,
            database_path: text("SHARECLOUD_DB_PATH", DEFAULT_DB_PATH),
            public_url: text("SHARECLOUD_PUBLIC_URL", DEFAULT_PUBLIC_URL),
            admin_email: text("SHARECLOUD_ADMIN_EMAIL", DEFAULT_ADMIN_EMAIL),
            admin_password: text("SHARECLOUD_ADMIN_PASSWORD", DEFAULT_ADMIN_PASSWORD),
            upload_delay: Duration::from_millis(parse(
                &lookup,
                "SHARECLOUD_UPLOAD_DELAY_MS",
                DEFAULT_UPLOAD_DELAY_MS,
            )?),
            progress_tick: Duration::from_millis(parse(
                &lookup,
                "SHARECLOUD_PROGRESS_TICK_MS",
                DEFAULT_PROGRESS_TICK_MS,
            )?),
            max_upload_bytes: parse(&lookup, "SHARECLOUD_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            storage_quota_bytes: (quota > 0).then_some(quota),
        })
    }

    pub fn uses_default_credentials(&self) -> bool {
        self.admin_email == DEFAULT_ADMIN_EMAIL && self.admin_password == DEFAULT_ADMIN_PASSWORD
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn parse<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            key: key.to_string(),
            value: raw,
        }),
    }
}
