use std::{net::SocketAddr, time::Duration};

use reqwest::Url;

pub const DEFAULT_BIND: &str = "0.0.0.0:3000";
pub const DEFAULT_UPSTREAM_URL: &str = "http://localhost:3003";
pub const DEFAULT_UPSTREAM_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    Missing(&'static str),
    #[error("environment variable {name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Process-wide settings, read once at startup and handed to [`crate::AppState`].
#[derive(Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub upstream_url: Url,
    pub upstream_timeout: Duration,
    /// Bearer token presented to the upstream object service, if it wants one.
    pub upstream_token: Option<String>,
    pub jwt_secret: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = lookup("RESGATE_BIND")
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
            .parse()
            .map_err(|err: std::net::AddrParseError| ConfigError::Invalid {
                name: "RESGATE_BIND",
                reason: err.to_string(),
            })?;

        let upstream_url = parse_upstream_url(
            &lookup("RESGATE_UPSTREAM_URL").unwrap_or_else(|| DEFAULT_UPSTREAM_URL.to_string()),
        )?;

        let upstream_timeout = match lookup("RESGATE_UPSTREAM_TIMEOUT_MS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(0) => {
                    return Err(ConfigError::Invalid {
                        name: "RESGATE_UPSTREAM_TIMEOUT_MS",
                        reason: "must be greater than zero".to_string(),
                    })
                }
                Ok(ms) => Duration::from_millis(ms),
                Err(err) => {
                    return Err(ConfigError::Invalid {
                        name: "RESGATE_UPSTREAM_TIMEOUT_MS",
                        reason: err.to_string(),
                    })
                }
            },
            None => Duration::from_millis(DEFAULT_UPSTREAM_TIMEOUT_MS),
        };

        let upstream_token = lookup("RESGATE_UPSTREAM_TOKEN").filter(|token| !token.is_empty());

        let jwt_secret = lookup("RESGATE_JWT_SECRET")
            .filter(|secret| !secret.is_empty())
            .ok_or(ConfigError::Missing("RESGATE_JWT_SECRET"))?;

        Ok(Self {
            bind_addr,
            upstream_url,
            upstream_timeout,
            upstream_token,
            jwt_secret,
        })
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bind_addr", &self.bind_addr)
            .field("upstream_url", &self.upstream_url.as_str())
            .field("upstream_timeout", &self.upstream_timeout)
            .field("upstream_token", &self.upstream_token.as_ref().map(|_| ".."))
            .field("jwt_secret", &"..")
            .finish()
    }
}

fn parse_upstream_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        name: "RESGATE_UPSTREAM_URL",
        reason,
    };

    let url = Url::parse(raw).map_err(|err| invalid(err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(invalid(format!("{raw:?} is not an http(s) base URL")));
    }

    Ok(url)
}
