use std::{env, fmt::Display, fs::read_to_string, str::FromStr, time::Duration};

use thiserror::Error;
use tracing::{info, warn};
use upstream::Credentials;

/// Looked up in the environment first, then in `/run/secrets/<NAME>`.
const SECRET_KEYS: [&str; 2] = ["CLIENT_ID", "CLIENT_SECRET"];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),

    #[error("Invalid {key} value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub upstream_url: String,
    pub credentials: Credentials,
    pub users_ttl: Duration,
    pub posts_ttl: Duration,
    pub users_refresh: Duration,
    pub posts_refresh: Duration,
    pub token_margin: Duration,
    pub fetch_concurrency: usize,
    pub redis_url: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| {
            env::var(key).ok().or_else(|| {
                SECRET_KEYS
                    .contains(&key)
                    .then(|| read_secret(key))
                    .flatten()
            })
        })
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut credentials = Credentials::new(
            required(&lookup, "CLIENT_ID")?,
            required(&lookup, "CLIENT_SECRET")?,
        );
        credentials.company_name = optional(&lookup, "COMPANY_NAME");
        credentials.owner_name = optional(&lookup, "OWNER_NAME");
        credentials.owner_email = optional(&lookup, "OWNER_EMAIL");
        credentials.roll_no = optional(&lookup, "ROLL_NO");

        let users_ttl = seconds(&lookup, "USERS_TTL_SECS", "300")?;
        let posts_ttl = seconds(&lookup, "POSTS_TTL_SECS", "60")?;

        let users_refresh =
            seconds(&lookup, "USERS_REFRESH_SECS", &users_ttl.as_secs().to_string())?;
        let posts_refresh =
            seconds(&lookup, "POSTS_REFRESH_SECS", &posts_ttl.as_secs().to_string())?;

        let fetch_concurrency: usize = try_load(&lookup, "FETCH_CONCURRENCY", "1")?;
        if fetch_concurrency == 0 {
            return Err(ConfigError::Invalid {
                key: "FETCH_CONCURRENCY",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            port: try_load(&lookup, "RUST_PORT", "1111")?,
            upstream_url: try_load(&lookup, "UPSTREAM_URL", "http://localhost:9876")?,
            credentials,
            users_ttl,
            posts_ttl,
            users_refresh,
            posts_refresh,
            token_margin: Duration::from_secs(try_load(&lookup, "TOKEN_MARGIN_SECS", "60")?),
            fetch_concurrency,
            redis_url: optional(&lookup, "REDIS_URL"),
        })
    }
}

fn optional(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<String, ConfigError> {
    optional(lookup, key).ok_or_else(|| {
        warn!("{key} not set");
        ConfigError::Missing(key)
    })
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = optional(lookup, key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
        value,
    })
}

/// Whole seconds, never zero.
fn seconds(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<Duration, ConfigError> {
    let secs: u64 = try_load(lookup, key, default)?;
    if secs == 0 {
        return Err(ConfigError::Invalid {
            key,
            value: "0".to_string(),
            reason: "must be at least 1 second".to_string(),
        });
    }

    Ok(Duration::from_secs(secs))
}

fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            warn!("Failed to read {secret_name} from file: {e}");
        })
        .ok()
}
