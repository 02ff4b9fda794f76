use std::env;
use std::time::Duration;

use thiserror::Error;

use credentials::{HashParams, MIN_SECRET_LEN};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Service configuration, read once at startup.
#[derive(Clone)]
pub struct Config {
    pub port: u16,
    /// When absent the service runs on an in-memory store.
    pub database_url: Option<String>,
    pub signing_key: String,
    pub issuer: String,
    pub audience: String,
    pub token_ttl: Duration,
    pub cdn_base_url: String,
    pub hash_params: HashParams,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let signing_key = lookup("SIGNING_KEY")
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::Missing("SIGNING_KEY"))?;

        if signing_key.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid {
                name: "SIGNING_KEY",
                value: format!("key must be at least {} bytes, got {}", MIN_SECRET_LEN, signing_key.len()),
            });
        }

        let port = parse_or(&lookup, "PORT", 3000)?;
        let token_ttl_minutes: u64 = parse_or(&lookup, "TOKEN_TTL_MINUTES", 15)?;
        let log_n = parse_or(&lookup, "SCRYPT_LOG_N", HashParams::RECOMMENDED_LOG_N)?;

        let hash_params = HashParams::new(log_n, HashParams::RECOMMENDED_R, HashParams::RECOMMENDED_P, HashParams::RECOMMENDED_LEN)
            .map_err(|_| ConfigError::Invalid { name: "SCRYPT_LOG_N", value: log_n.to_string() })?;

        let cdn_base_url = lookup("VIDEO_CDN_BASE_URL")
            .unwrap_or_else(|| "https://videos.example.com".to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Config {
            port,
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            signing_key,
            issuer: lookup("ISSUER").unwrap_or_else(|| "video-service".to_string()),
            audience: lookup("AUDIENCE").unwrap_or_else(|| "video-service".to_string()),
            token_ttl: Duration::from_secs(token_ttl_minutes * 60),
            cdn_base_url,
            hash_params,
        })
    }
}

fn parse_or<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &'static str, default: T) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const KEY: &str = "0123456789abcdef0123456789abcdef";

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = config_from(&[("SIGNING_KEY", KEY)]).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.database_url, None);
        assert_eq!(config.token_ttl, Duration::from_secs(15 * 60));
        assert_eq!(config.cdn_base_url, "https://videos.example.com");
        assert_eq!(config.issuer, "video-service");
    }

    #[test]
    fn signing_key_is_required() {
        assert!(matches!(config_from(&[]), Err(ConfigError::Missing("SIGNING_KEY"))));
    }

    #[test]
    fn short_signing_key_is_rejected() {
        let result = config_from(&[("SIGNING_KEY", "secret")]);

        assert!(matches!(result, Err(ConfigError::Invalid { name: "SIGNING_KEY", .. })));
    }

    #[test]
    fn accepted_signing_key_can_issue_tokens() {
        let config = config_from(&[("SIGNING_KEY", KEY)]).unwrap();
        let tokens = credentials::TokenIssuer::new(config.signing_key.as_bytes(), config.issuer, config.audience, config.token_ttl);

        assert!(tokens.issue("a@x.com", "user-1").is_ok());
    }

    #[test]
    fn bad_port_is_reported() {
        let result = config_from(&[("SIGNING_KEY", KEY), ("PORT", "eighty")]);

        assert!(matches!(result, Err(ConfigError::Invalid { name: "PORT", .. })));
    }

    #[test]
    fn cdn_base_url_loses_trailing_slash() {
        let config = config_from(&[("SIGNING_KEY", KEY), ("VIDEO_CDN_BASE_URL", "https://cdn.test/")]).unwrap();

        assert_eq!(config.cdn_base_url, "https://cdn.test");
    }
}
