use std::env;
use std::time::Duration;
use crate::error::{AppError, Result};

const TIMEOUT_VAR: &str = "CLEAN_NEWS_TIMEOUT_SECS";
const MAX_ELEMENTS_VAR: &str = "CLEAN_NEWS_MAX_ELEMENTS";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Timeout for the whole GET, connect through body.
    pub request_timeout: Duration,
    /// Element cap handed to the readability parser; 0 means unlimited.
    pub max_elements: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_elements: 0,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source, falling back to
    /// defaults for anything unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(raw) = lookup(TIMEOUT_VAR) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|e| AppError::ConfigError(format!("Invalid {}: {}", TIMEOUT_VAR, e)))?;
            if secs == 0 {
                return Err(AppError::ConfigError(format!("{} must be positive", TIMEOUT_VAR)));
            }
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = lookup(MAX_ELEMENTS_VAR) {
            config.max_elements = raw
                .trim()
                .parse::<usize>()
                .map_err(|e| AppError::ConfigError(format!("Invalid {}: {}", MAX_ELEMENTS_VAR, e)))?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.max_elements, 0);
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            (TIMEOUT_VAR, " 5 "),
            (MAX_ELEMENTS_VAR, "9000"),
        ]))
        .unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.max_elements, 9000);
    }

    #[test]
    fn rejects_garbage_timeout() {
        let err = Config::from_lookup(lookup_from(&[(TIMEOUT_VAR, "soon")])).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn rejects_zero_timeout() {
        let err = Config::from_lookup(lookup_from(&[(TIMEOUT_VAR, "0")])).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }
}
