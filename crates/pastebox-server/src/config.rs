use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, bail};
use chrono::TimeDelta;
use pastebox_crypto::DEFAULT_TOKEN_TTL_HOURS;

/// Placeholder token secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "secret",
];

const MIN_SECRET_LEN: usize = 32;

/// One year.
const MAX_TOKEN_TTL_HOURS: i64 = 24 * 366;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub token_secret: String,
    pub token_ttl: TimeDelta,
    pub max_body_bytes: usize,
    pub cleanup_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token_secret = lookup("PASTEBOX_TOKEN_SECRET").unwrap_or_default();
        if token_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&token_secret.as_str()) {
            bail!("PASTEBOX_TOKEN_SECRET is unset or still a placeholder");
        }
        if token_secret.len() < MIN_SECRET_LEN {
            bail!(
                "PASTEBOX_TOKEN_SECRET must be at least {} bytes",
                MIN_SECRET_LEN
            );
        }

        let ttl_hours: i64 = parse_or(&lookup, "PASTEBOX_TOKEN_TTL_HOURS", DEFAULT_TOKEN_TTL_HOURS)?;
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&ttl_hours) {
            bail!(
                "PASTEBOX_TOKEN_TTL_HOURS must be between 1 and {}",
                MAX_TOKEN_TTL_HOURS
            );
        }
        let token_ttl = TimeDelta::try_hours(ttl_hours)
            .context("PASTEBOX_TOKEN_TTL_HOURS is out of range")?;

        let cleanup_interval_secs = parse_or(&lookup, "PASTEBOX_CLEANUP_INTERVAL_SECS", 300)?;
        if cleanup_interval_secs == 0 {
            bail!("PASTEBOX_CLEANUP_INTERVAL_SECS must be greater than zero");
        }

        Ok(Self {
            host: lookup("PASTEBOX_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&lookup, "PASTEBOX_PORT", 3000)?,
            db_path: lookup("PASTEBOX_DB_PATH")
                .unwrap_or_else(|| "pastebox.db".into())
                .into(),
            token_secret,
            token_ttl,
            max_body_bytes: parse_or(&lookup, "PASTEBOX_MAX_BODY_BYTES", 10 * 1024)?,
            cleanup_interval_secs,
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(v) => v
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", key, v)),
        None => Ok(default),
    }
}
