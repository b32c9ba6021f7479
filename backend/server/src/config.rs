use std::{env, fmt::Display, fs::read_to_string, str::FromStr, time::Duration};

use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {key} value: {reason}")]
    Invalid { key: String, reason: String },

    #[error("Secret {0} not found in /run/secrets or the environment")]
    MissingSecret(String),
}

pub struct Config {
    pub port: u16,
    pub redis_url: String,
    pub meili_url: String,
    pub meili_key: String,
    pub tick: Duration,
    pub broadcast_capacity: usize,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let tick_ms: u64 = try_load("TICK_MS", "1000")?;
        if tick_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "TICK_MS".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            port: try_load("RUST_PORT", "5000")?,
            redis_url: try_load("REDIS_URL", "redis://127.0.0.1:6379")?,
            meili_url: try_load("MEILI_URL", "http://127.0.0.1:7700")?,
            meili_key: read_secret("MEILI_ADMIN_KEY")?,
            tick: Duration::from_millis(tick_ms),
            broadcast_capacity: try_load("BROADCAST_CAPACITY", "64")?,
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key)
        .map_err(|_| {
            warn!("Environment variable {key} not found, using default");
        })
        .ok()
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    parse(
        key,
        var(key).unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        }),
    )
}

fn parse<T: FromStr>(key: &str, raw: String) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    raw.parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");

        ConfigError::Invalid {
            key: key.to_string(),
            reason: e.to_string(),
        }
    })
}

fn read_secret(secret_name: &str) -> Result<String, ConfigError> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .or_else(|e| {
            warn!("Failed to read {secret_name} from file: {e}");
            env::var(secret_name)
        })
        .map_err(|_| ConfigError::MissingSecret(secret_name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let port: u16 = parse("RUST_PORT", "5000".to_string()).unwrap();
        assert_eq!(port, 5000);
    }

    #[test]
    fn test_parse_invalid() {
        let err = parse::<u16>("RUST_PORT", "port".to_string()).unwrap_err();

        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "RUST_PORT"));
    }

    #[test]
    fn test_parse_out_of_range() {
        assert!(parse::<u16>("RUST_PORT", "70000".to_string()).is_err());
    }
}
