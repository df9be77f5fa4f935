use dotenvy::dotenv;
use rand::{rngs::OsRng, RngCore};
use std::env;
use thiserror::Error;
use tracing::warn;

const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{key} must be {expected}, got {value:?}")]
    Invalid {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key/value source. `from_env` passes the
    /// process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = match lookup("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                expected: "a valid u16 number",
                value: raw,
            })?,
            None => 8000,
        };

        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://todo.db".to_string());

        let jwt_secret = match lookup("JWT_SECRET") {
            Some(secret) if !secret.is_empty() => secret,
            _ => {
                warn!("JWT_SECRET not set, sessions will not survive a restart");
                random_secret()
            }
        };

        let session_ttl_hours = match lookup("SESSION_TTL_HOURS") {
            Some(raw) => match raw.parse::<i64>() {
                Ok(hours) if hours > 0 && hours <= MAX_SESSION_TTL_HOURS => hours,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "SESSION_TTL_HOURS",
                        expected: "a number of hours between 1 and 8760",
                        value: raw,
                    })
                }
            },
            None => 24,
        };

        Ok(Self {
            host,
            port,
            database_url,
            jwt_secret,
            session_ttl_hours,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn random_secret() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.addr(), "127.0.0.1:8000");
        assert_eq!(config.database_url, "sqlite://todo.db");
        assert_eq!(config.session_ttl_hours, 24);
        assert_eq!(config.jwt_secret.len(), 64);
    }

    #[test]
    fn explicit_values_are_used() {
        let config = config_from(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "3000"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("JWT_SECRET", "s3cret"),
            ("SESSION_TTL_HOURS", "2"),
        ])
        .unwrap();

        assert_eq!(config.addr(), "0.0.0.0:3000");
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.jwt_secret, "s3cret");
        assert_eq!(config.session_ttl_hours, 2);
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();

        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
    }

    #[test]
    fn out_of_range_ttl_is_rejected() {
        for raw in ["0", "-3", "100000", "soon"] {
            let err = config_from(&[("SESSION_TTL_HOURS", raw)]).unwrap_err();
            assert!(matches!(
                err,
                ConfigError::Invalid {
                    key: "SESSION_TTL_HOURS",
                    ..
                }
            ));
        }
    }

    #[test]
    fn zero_ttl_message_names_the_key() {
        let err = config_from(&[("SESSION_TTL_HOURS", "0")]).unwrap_err();

        assert!(err.to_string().starts_with("SESSION_TTL_HOURS must be"));
    }

    #[test]
    fn generated_secrets_differ() {
        assert_ne!(random_secret(), random_secret());
    }
}
