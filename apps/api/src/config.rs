use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::Semaphore;

/// How bearer tokens are signed.
#[derive(Debug, Clone, PartialEq)]
pub enum JwtKeys {
    /// HS256 with a shared secret (`JWT_SECRET`).
    Secret(String),
    /// RS256 with PEM files on disk.
    RsaPem {
        private_key_path: String,
        public_key_path: String,
    },
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub jwt_keys: JwtKeys,
    /// Lifetime of issued bearer tokens.
    pub jwt_ttl: Duration,
    pub port: u16,
    pub rust_log: String,
    /// Lifetime of cached job criteria.
    pub job_cache_ttl: Duration,
    /// Upper bound on applications screened concurrently; `None` = unbounded.
    pub match_max_concurrency: Option<usize>,
    /// Per-batch screening deadline.
    pub match_deadline: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let jwt_keys = match optional_env("JWT_SECRET") {
            Some(secret) => JwtKeys::Secret(secret),
            None => JwtKeys::RsaPem {
                private_key_path: optional_env("JWT_PRIVATE_KEY_PATH")
                    .unwrap_or_else(|| "private.pem".to_string()),
                public_key_path: optional_env("JWT_PUBLIC_KEY_PATH")
                    .unwrap_or_else(|| "pubkey.pem".to_string()),
            },
        };

        let match_max_concurrency =
            check_concurrency(parse_optional::<usize>("MATCH_MAX_CONCURRENCY")?)?;

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            jwt_keys,
            jwt_ttl: Duration::from_secs(parse_optional::<u64>("JWT_TTL_SECS")?.unwrap_or(3600)),
            port: parse_optional::<u16>("PORT")?.unwrap_or(8080),
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            job_cache_ttl: Duration::from_secs(
                parse_optional::<u64>("JOB_CACHE_TTL_SECS")?.unwrap_or(10),
            ),
            match_max_concurrency,
            match_deadline: parse_optional::<u64>("MATCH_DEADLINE_MS")?.map(Duration::from_millis),
        })
    }
}

/// A semaphore bound must be in `1..=Semaphore::MAX_PERMITS`.
fn check_concurrency(bound: Option<usize>) -> Result<Option<usize>> {
    match bound {
        Some(0) => anyhow::bail!("MATCH_MAX_CONCURRENCY must be greater than zero"),
        Some(n) if n > Semaphore::MAX_PERMITS => anyhow::bail!(
            "MATCH_MAX_CONCURRENCY must not exceed {}",
            Semaphore::MAX_PERMITS
        ),
        _ => Ok(bound),
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_optional<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    optional_env(key)
        .map(|raw| parse_value(key, &raw))
        .transpose()
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("{key} has an invalid value '{raw}'"))
}
