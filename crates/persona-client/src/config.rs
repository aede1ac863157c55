use std::env;
use std::time::Duration;

use crate::error::ClientError;

pub const BASE_URL_ENV: &str = "PERSONA_API_BASE_URL";
pub const TIMEOUT_ENV: &str = "PERSONA_API_TIMEOUT_SECS";

const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where the persona store lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let base_url = normalize_base_url(&base_url.into())?;
        Ok(Self {
            base_url,
            ..Self::default()
        })
    }

    /// Reads `PERSONA_API_BASE_URL` and `PERSONA_API_TIMEOUT_SECS`, falling back to defaults.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let mut config = Self::default();
        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|value| !value.trim().is_empty()) {
            config.base_url = normalize_base_url(&base_url)?;
        }
        if let Some(raw) = lookup(TIMEOUT_ENV) {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                ClientError::Config(format!("{} must be a whole number of seconds", TIMEOUT_ENV))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ClientError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ClientError::Config(format!(
            "base url '{}' must start with http:// or https://",
            raw
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_overrides_defaults() {
        let config = ClientConfig::from_lookup(|key| match key {
            BASE_URL_ENV => Some("https://persona.example.com/".into()),
            TIMEOUT_ENV => Some("5".into()),
            _ => None,
        })
        .expect("config");
        assert_eq!(config.base_url, "https://persona.example.com");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(
            config.endpoint("/store_persona"),
            "https://persona.example.com/store_persona"
        );
    }

    #[test]
    fn missing_values_use_defaults() {
        let config = ClientConfig::from_lookup(|_| None).expect("config");
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(ClientConfig::new("persona.example.com").is_err());
        assert!(
            ClientConfig::from_lookup(|key| (key == TIMEOUT_ENV).then(|| "soon".to_string()))
                .is_err()
        );
    }
}
