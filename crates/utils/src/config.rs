//! Runtime configuration shared by every entity screen.

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

pub const ENDPOINT_VAR: &str = "GRAPHQL_ENDPOINT";
pub const TOKENIZE_VAR: &str = "TOKENIZE";
pub const AUTH_TOKEN_VAR: &str = "GRAPHQL_AUTH_TOKEN";
pub const TIMEOUT_VAR: &str = "GRAPHQL_TIMEOUT_SECS";
pub const RETRIES_VAR: &str = "GRAPHQL_QUERY_RETRIES";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_QUERY_RETRIES: usize = 2;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing configuration: {0} is not set")]
    Missing(&'static str),
    #[error("invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug)]
pub struct ClientConfig {
    pub endpoint: Url,
    /// Shared secret for tokenized payloads.
    pub tokenize_secret: SecretString,
    /// Optional bearer token sent with every request.
    pub auth_token: Option<SecretString>,
    pub request_timeout: Duration,
    /// Retry budget for read queries. Mutations are never retried.
    pub query_retries: usize,
}

impl ClientConfig {
    pub fn new(endpoint: Url, tokenize_secret: SecretString) -> Self {
        Self {
            endpoint,
            tokenize_secret,
            auth_token: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            query_retries: DEFAULT_QUERY_RETRIES,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let endpoint = get(ENDPOINT_VAR).ok_or(ConfigError::Missing(ENDPOINT_VAR))?;
        let endpoint = parse_endpoint(&endpoint)?;
        let secret = get(TOKENIZE_VAR).ok_or(ConfigError::Missing(TOKENIZE_VAR))?;

        let mut config = Self::new(endpoint, SecretString::from(secret));
        config.auth_token = get(AUTH_TOKEN_VAR).map(SecretString::from);
        if let Some(raw) = get(TIMEOUT_VAR) {
            let secs = raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                name: TIMEOUT_VAR,
                reason: e.to_string(),
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = get(RETRIES_VAR) {
            config.query_retries = raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Invalid {
                    name: RETRIES_VAR,
                    reason: e.to_string(),
                }
            })?;
        }
        Ok(config)
    }
}

pub fn parse_endpoint(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::Invalid {
        name: ENDPOINT_VAR,
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Invalid {
            name: ENDPOINT_VAR,
            reason: format!("unsupported scheme {other}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENDPOINT_VAR, "http://localhost:4000/graphql"),
            (TOKENIZE_VAR, "secret"),
        ]))
        .unwrap();
        assert_eq!(config.endpoint.as_str(), "http://localhost:4000/graphql");
        assert_eq!(config.tokenize_secret.expose_secret(), "secret");
        assert!(config.auth_token.is_none());
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.query_retries, 2);
    }

    #[test]
    fn test_missing_secret() {
        let err = ClientConfig::from_lookup(lookup(&[(ENDPOINT_VAR, "http://x/graphql")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing(TOKENIZE_VAR)));
    }

    #[test]
    fn test_blank_secret_counts_as_missing() {
        let err = ClientConfig::from_lookup(lookup(&[
            (ENDPOINT_VAR, "http://x/graphql"),
            (TOKENIZE_VAR, "   "),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing(TOKENIZE_VAR)));
    }

    #[test]
    fn test_overrides_and_invalid_values() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENDPOINT_VAR, "https://api.example.org/graphql"),
            (TOKENIZE_VAR, "secret"),
            (AUTH_TOKEN_VAR, "bearer"),
            (TIMEOUT_VAR, "5"),
            (RETRIES_VAR, "0"),
        ]))
        .unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.query_retries, 0);
        assert!(config.auth_token.is_some());

        let err = ClientConfig::from_lookup(lookup(&[
            (ENDPOINT_VAR, "ftp://api.example.org"),
            (TOKENIZE_VAR, "secret"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: ENDPOINT_VAR, .. }));
    }
}
