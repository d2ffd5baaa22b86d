//! Client configuration

use crate::auth::{DEFAULT_CREDENTIAL_TTL, DEFAULT_TOKEN_KEY};
use crate::batch::BatchConfig;
use crate::{CrmError, Result};
use reqwest::Url;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const ENDPOINT_ENV: &str = "CRM_GRAPHQL_ENDPOINT";
pub const BATCH_MAX_SIZE_ENV: &str = "CRM_BATCH_MAX_SIZE";
pub const BATCH_WINDOW_ENV: &str = "CRM_BATCH_WINDOW_MS";
pub const BATCHING_ENV: &str = "CRM_BATCHING";
pub const CREDENTIAL_TTL_ENV: &str = "CRM_CREDENTIAL_TTL_MS";
pub const TOKEN_KEY_ENV: &str = "CRM_TOKEN_KEY";

/// Everything needed to build a [`crate::CrmClient`]
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub endpoint: Url,
    pub batch: BatchConfig,
    pub batching_enabled: bool,
    pub credential_ttl: Duration,
    pub token_key: String,
}

impl ClientConfig {
    /// Configuration with defaults for everything but the endpoint
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            batch: BatchConfig::default(),
            batching_enabled: true,
            credential_ttl: DEFAULT_CREDENTIAL_TTL,
            token_key: DEFAULT_TOKEN_KEY.to_string(),
        }
    }

    /// Parse the endpoint, rejecting anything but http(s)
    pub fn parse_endpoint(raw: &str) -> Result<Url> {
        let url = Url::parse(raw.trim())
            .map_err(|e| CrmError::Config(format!("invalid {ENDPOINT_ENV} `{raw}`: {e}")))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(CrmError::Config(format!(
                "unsupported endpoint scheme `{other}` in {ENDPOINT_ENV}"
            ))),
        }
    }

    /// Load from the environment
    ///
    /// The endpoint is required; a missing or malformed value is fatal.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with_endpoint(None)
    }

    /// Load from the environment, taking the endpoint from `endpoint`
    /// when given
    pub fn from_env_with_endpoint(endpoint: Option<&str>) -> Result<Self> {
        let endpoint = match endpoint {
            Some(raw) => Self::parse_endpoint(raw)?,
            None => Self::parse_endpoint(&required_env(ENDPOINT_ENV)?)?,
        };
        let mut config = Self::new(endpoint);

        if let Some(size) = parsed_env::<usize>(BATCH_MAX_SIZE_ENV)? {
            config.batch.max_batch_size = size;
        }
        if let Some(window) = parsed_env::<u64>(BATCH_WINDOW_ENV)? {
            config.batch.batch_window = Duration::from_millis(window);
        }
        if let Some(enabled) = parsed_env::<bool>(BATCHING_ENV)? {
            config.batching_enabled = enabled;
        }
        if let Some(ttl) = parsed_env::<u64>(CREDENTIAL_TTL_ENV)? {
            config.credential_ttl = Duration::from_millis(ttl);
        }
        if let Ok(key) = env::var(TOKEN_KEY_ENV) {
            config.token_key = key;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch.max_batch_size == 0 {
            return Err(CrmError::Config(format!(
                "{BATCH_MAX_SIZE_ENV} must be at least 1"
            )));
        }
        if self.token_key.is_empty() {
            return Err(CrmError::Config(format!("{TOKEN_KEY_ENV} must not be empty")));
        }
        Ok(())
    }
}

pub fn required_env(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(CrmError::Config(format!("missing env: {name}"))),
    }
}

fn parsed_env<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| CrmError::Config(format!("invalid {name} `{raw}`: {e}"))),
        Err(_) => Ok(None),
    }
}
